use super::common::{assessment_id, candidate, detail};
use crate::portal::candidates::{
    AssessmentId, BoardError, CandidateBoard, CandidateId, CandidateStatus, StatusConfirmation,
};

fn three_of_five() -> CandidateBoard {
    CandidateBoard::from_detail(detail(
        5,
        vec![
            candidate("c-1", "Ada", CandidateStatus::Invited),
            candidate("c-2", "Grace", CandidateStatus::Interview),
            candidate("c-3", "Linus", CandidateStatus::Rejected),
        ],
    ))
}

fn confirmation(candidate: &str, status: Option<CandidateStatus>) -> StatusConfirmation {
    StatusConfirmation {
        assessment_id: assessment_id(),
        candidate_id: CandidateId::new(candidate),
        requested: CandidateStatus::Interview,
        confirmed: status,
    }
}

#[test]
fn added_count_is_the_collection_length() {
    let board = three_of_five();
    assert_eq!(board.added_count(), 3);
    assert_eq!(board.required_count(), 5);
    assert_eq!(board.remaining_slots(), 2);
}

#[test]
fn inline_candidates_are_used_when_detail_list_is_empty() {
    let mut payload = detail(1, Vec::new());
    payload.assessment.candidates = vec![candidate("c-9", "Barbara", CandidateStatus::Invited)];

    let board = CandidateBoard::from_detail(payload);
    assert_eq!(board.added_count(), 1);
    assert!(board.assessment().candidates.is_empty());
}

#[test]
fn rows_carry_progress_and_step_labels() {
    let rows = three_of_five().rows();
    let progress: Vec<u8> = rows.iter().map(|row| row.progress_index).collect();
    assert_eq!(progress, vec![0, 1, 2]);
    assert_eq!(rows[0].initial, 'A');
    assert_eq!(rows[2].step_labels, ["Invited", "Interview", "Rejected"]);
    assert_eq!(rows[1].step_labels[2], "Feedback");
}

#[test]
fn transition_request_uses_displayed_status() {
    let board = three_of_five();
    let request = board
        .transition_request(&CandidateId::new("c-2"), CandidateStatus::Shortlisted)
        .expect("known candidate");

    assert_eq!(request.assessment_id, Some(assessment_id()));
    assert_eq!(request.current, CandidateStatus::Interview);
    assert_eq!(request.requested, CandidateStatus::Shortlisted);

    assert_eq!(
        board.transition_request(&CandidateId::new("missing"), CandidateStatus::Interview),
        Err(BoardError::UnknownCandidate(CandidateId::new("missing")))
    );
}

#[test]
fn transition_request_without_assessment_id_carries_none() {
    let mut payload = detail(1, vec![candidate("c-1", "Ada", CandidateStatus::Invited)]);
    payload.assessment.assessment_id = AssessmentId::new("");
    let board = CandidateBoard::from_detail(payload);

    let request = board
        .transition_request(&CandidateId::new("c-1"), CandidateStatus::Interview)
        .expect("known candidate");
    assert_eq!(request.assessment_id, None);
}

#[test]
fn apply_confirmation_only_touches_the_confirmed_candidate() {
    let mut board = three_of_five();

    assert!(board.apply_confirmation(&confirmation("c-1", Some(CandidateStatus::Interview))));
    let statuses: Vec<CandidateStatus> = board.candidates().iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        vec![
            CandidateStatus::Interview,
            CandidateStatus::Interview,
            CandidateStatus::Rejected
        ]
    );

    assert!(!board.apply_confirmation(&confirmation("c-1", Some(CandidateStatus::Interview))));
    assert!(!board.apply_confirmation(&confirmation("c-1", None)));
    assert!(!board.apply_confirmation(&confirmation("missing", Some(CandidateStatus::Rejected))));

    let mut foreign = confirmation("c-2", Some(CandidateStatus::Shortlisted));
    foreign.assessment_id = AssessmentId::new("other-assessment");
    assert!(!board.apply_confirmation(&foreign));
}

#[test]
fn merge_added_appends_new_and_replaces_known_candidates() {
    let mut board = three_of_five();
    let mut updated = candidate("c-2", "Grace", CandidateStatus::Interview);
    updated.phone = Some("+44 20 7946 0000".to_string());

    board.merge_added(vec![
        updated,
        candidate("c-4", "Ken", CandidateStatus::Invited),
    ]);

    let ids: Vec<&str> = board
        .candidates()
        .iter()
        .map(|c| c.candidate_uuid.as_str())
        .collect();
    assert_eq!(ids, vec!["c-1", "c-2", "c-3", "c-4"]);
    assert_eq!(board.added_count(), 4);
    assert_eq!(board.remaining_slots(), 1);
    assert!(board
        .candidate(&CandidateId::new("c-2"))
        .and_then(|c| c.phone.as_deref())
        .is_some());
}

#[test]
fn refresh_replaces_everything() {
    let mut board = three_of_five();
    board.refresh(detail(2, vec![candidate("c-7", "Edsger", CandidateStatus::Shortlisted)]));

    assert_eq!(board.added_count(), 1);
    assert_eq!(board.required_count(), 2);

    board.replace_candidates(Vec::new());
    assert_eq!(board.added_count(), 0);
    assert_eq!(board.remaining_slots(), 2);
}
