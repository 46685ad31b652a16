use std::sync::Arc;

use serde_json::json;

use super::common::*;
use crate::portal::candidates::{AssessmentId, CandidateId, CandidateStatus};
use crate::portal::server::repository::PortalRepository;
use crate::portal::server::{
    AssessmentDraft, InMemoryPortalRepository, PortalServiceError, VendorPortalService,
};

#[test]
fn duplicate_registration_is_rejected() {
    let service = build_service();
    service
        .register(registration("ops@acme.test"))
        .expect("first registration");

    let err = service
        .register(registration("OPS@acme.test"))
        .expect_err("duplicate");
    assert!(matches!(err, PortalServiceError::VendorExists));
    assert_eq!(err.to_string(), "Vendor already exists");
}

#[test]
fn login_rejects_wrong_password_and_unknown_email() {
    let service = build_service();
    service
        .register(registration("ops@acme.test"))
        .expect("registers");

    assert!(matches!(
        service.login("ops@acme.test", "nope"),
        Err(PortalServiceError::InvalidCredentials)
    ));
    assert!(matches!(
        service.login("nobody@acme.test", PASSWORD),
        Err(PortalServiceError::InvalidCredentials)
    ));
}

#[test]
fn authenticate_distinguishes_missing_and_invalid_sessions() {
    let service = build_service();
    let (_, token) = signed_in(&service, "ops@acme.test");

    assert!(matches!(
        service.authenticate(None),
        Err(PortalServiceError::NotAuthenticated)
    ));
    assert!(matches!(
        service.authenticate(Some("forged")),
        Err(PortalServiceError::SessionInvalid)
    ));

    service.logout(Some(&token)).expect("logout");
    assert!(matches!(
        service.authenticate(Some(&token)),
        Err(PortalServiceError::SessionInvalid)
    ));
}

#[test]
fn expired_sessions_are_dropped() {
    let repository = Arc::new(InMemoryPortalRepository::new());
    let service =
        VendorPortalService::with_session_ttl(repository.clone(), chrono::Duration::zero());
    service
        .register(registration("ops@acme.test"))
        .expect("registers");
    let session = service.login("ops@acme.test", PASSWORD).expect("logs in");

    assert!(matches!(
        service.authenticate(Some(&session.token)),
        Err(PortalServiceError::SessionInvalid)
    ));
    assert!(repository
        .session(&session.token)
        .expect("lookup")
        .is_none());
}

#[test]
fn assessment_draft_parses_leniently() {
    let draft = AssessmentDraft::from_payload(&json!({
        "title": "  Data Engineer ",
        "duration": "45.7",
        "required_candidates": -3,
        "experience": "2+ years",
    }))
    .expect("draft parses");

    assert_eq!(draft.title, "Data Engineer");
    assert_eq!(draft.duration, 45);
    assert_eq!(draft.required_candidates, 0);
    assert_eq!(draft.work_experience.as_deref(), Some("2+ years"));

    let garbage = AssessmentDraft::from_payload(&json!({
        "title": "QA",
        "duration": "soon",
        "required_candidates": "4",
    }))
    .expect("draft parses");
    assert_eq!(garbage.duration, 0);
    assert_eq!(garbage.required_candidates, 4);

    let err = AssessmentDraft::from_payload(&json!({ "title": "  " })).expect_err("no title");
    assert_eq!(err.to_string(), "Title is required");
}

#[test]
fn dashboard_lists_only_own_assessments_with_candidates() {
    let service = build_service();
    let (acme, _) = signed_in(&service, "ops@acme.test");
    let (globex, _) = signed_in(&service, "hr@globex.test");

    let assessment = service
        .create_assessment(&acme, draft(5))
        .expect("created");
    service
        .create_assessment(&globex, draft(1))
        .expect("created");
    service
        .add_candidate(
            &acme,
            &assessment.assessment_id,
            submission("Ada", "ada@example.com"),
        )
        .expect("added");

    let dashboard = service.dashboard(&acme).expect("dashboard");
    assert_eq!(dashboard.len(), 1);
    assert_eq!(dashboard[0].required_candidates, 5);
    assert_eq!(dashboard[0].added_count(), 1);
}

#[test]
fn add_candidate_validates_input_and_ownership() {
    let service = build_service();
    let (acme, _) = signed_in(&service, "ops@acme.test");
    let (globex, _) = signed_in(&service, "hr@globex.test");
    let assessment = service
        .create_assessment(&acme, draft(2))
        .expect("created");

    let mut missing_email = submission("Ada", "");
    missing_email.email = Some("   ".to_string());
    assert!(matches!(
        service.add_candidate(&acme, &assessment.assessment_id, missing_email),
        Err(PortalServiceError::InvalidInput(message)) if message == "Name and email are required"
    ));

    assert!(matches!(
        service.add_candidate(
            &acme,
            &AssessmentId::new("not-a-uuid"),
            submission("Ada", "ada@example.com")
        ),
        Err(PortalServiceError::InvalidInput(_))
    ));

    assert!(matches!(
        service.add_candidate(
            &globex,
            &assessment.assessment_id,
            submission("Ada", "ada@example.com")
        ),
        Err(PortalServiceError::AssessmentNotOwned)
    ));
}

#[test]
fn adding_the_same_email_twice_reuses_the_candidate() {
    let service = build_service();
    let (acme, _) = signed_in(&service, "ops@acme.test");
    let assessment = service
        .create_assessment(&acme, draft(2))
        .expect("created");

    let first = service
        .add_candidate(
            &acme,
            &assessment.assessment_id,
            submission("Ada", "ada@example.com"),
        )
        .expect("added");
    let second = service
        .add_candidate(
            &acme,
            &assessment.assessment_id,
            submission("Ada", "ada@example.com"),
        )
        .expect("added again");

    assert_eq!(first.candidate_uuid, second.candidate_uuid);
    let detail = service
        .assessment_detail(&acme, &assessment.assessment_id)
        .expect("detail");
    assert_eq!(detail.candidates.len(), 1);
    assert_eq!(detail.candidates[0].status, CandidateStatus::Invited);
}

#[test]
fn status_update_follows_the_lifecycle() {
    let service = build_service();
    let (acme, _) = signed_in(&service, "ops@acme.test");
    let assessment = service
        .create_assessment(&acme, draft(1))
        .expect("created");
    let candidate = service
        .add_candidate(
            &acme,
            &assessment.assessment_id,
            submission("Ada", "ada@example.com"),
        )
        .expect("added");
    let id = &assessment.assessment_id;
    let uuid = &candidate.candidate_uuid;

    let change = service
        .update_status(&acme, id, uuid, Some("Interview"))
        .expect("invited -> interview");
    assert_eq!(change.stored, "interviewed");
    assert_eq!(change.candidate.status, CandidateStatus::Interview);

    let repeat = service
        .update_status(&acme, id, uuid, Some("interviewed"))
        .expect("idempotent");
    assert_eq!(repeat.candidate.status, CandidateStatus::Interview);

    assert!(matches!(
        service.update_status(&acme, id, uuid, Some("invited")),
        Err(PortalServiceError::IllegalTransition {
            from: CandidateStatus::Interview,
            to: CandidateStatus::Invited,
        })
    ));

    let done = service
        .update_status(&acme, id, uuid, Some("shortlisted"))
        .expect("interview -> shortlisted");
    assert_eq!(done.stored, "shortlisted");
}

#[test]
fn status_update_error_cases() {
    let service = build_service();
    let (acme, _) = signed_in(&service, "ops@acme.test");
    let (globex, _) = signed_in(&service, "hr@globex.test");
    let assessment = service
        .create_assessment(&acme, draft(1))
        .expect("created");
    let candidate = service
        .add_candidate(
            &acme,
            &assessment.assessment_id,
            submission("Ada", "ada@example.com"),
        )
        .expect("added");
    let id = &assessment.assessment_id;

    let err = service
        .update_status(&acme, id, &candidate.candidate_uuid, Some("hired"))
        .expect_err("unknown status");
    assert_eq!(
        err.to_string(),
        "Invalid status. Allowed values: invited, interview, shortlisted, rejected"
    );
    assert!(matches!(
        service.update_status(&acme, id, &candidate.candidate_uuid, None),
        Err(PortalServiceError::InvalidStatus(_))
    ));
    assert!(matches!(
        service.update_status(&acme, id, &CandidateId::new("ghost"), Some("interview")),
        Err(PortalServiceError::CandidateNotLinked)
    ));
    assert!(matches!(
        service.update_status(&globex, id, &candidate.candidate_uuid, Some("interview")),
        Err(PortalServiceError::Forbidden)
    ));
}

#[test]
fn change_password_requires_the_current_one() {
    let service = build_service();
    let (acme, _) = signed_in(&service, "ops@acme.test");

    let err = service
        .change_password(&acme, "wrong", "new-secret")
        .expect_err("wrong current password");
    assert_eq!(err.to_string(), "Current password incorrect");

    service
        .change_password(&acme, PASSWORD, "new-secret")
        .expect("changed");
    assert!(service.login("ops@acme.test", "new-secret").is_ok());
    assert!(matches!(
        service.login("ops@acme.test", PASSWORD),
        Err(PortalServiceError::InvalidCredentials)
    ));
}
