use chrono::{Duration, TimeZone, Utc};
use league_ledger::{
    competition::{AttributedParticipant, EventModel, EventStatus},
    ledger::{NewAward, PlacementPoints, PointCategory, PointOutcome, SourceRef},
    sessions::{HighScoreSession, NewSession, ScoreOwner, ScoreSubmission, SessionStatus},
};

mod utils;

use utils::*;

fn top_two() -> Vec<PlacementPoints> {
    vec![
        PlacementPoints {
            placement: 1,
            points: 10.0,
        },
        PlacementPoints {
            placement: 2,
            points: 5.0,
        },
    ]
}

fn new_session(game_type_id: &str, config: Option<Vec<PlacementPoints>>) -> NewSession {
    NewSession {
        event_id: EVENT_ID.to_string(),
        event_game_type_id: game_type_id.to_string(),
        name: format!("{} night", game_type_id),
        placement_point_config: config,
    }
}

fn by(participant: AttributedParticipant, score: f64) -> ScoreSubmission {
    ScoreSubmission {
        owner: ScoreOwner::Participant(participant),
        score,
        achieved_at: None,
    }
}

fn by_team(team_id: &str, score: f64) -> ScoreSubmission {
    ScoreSubmission {
        owner: ScoreOwner::Team {
            team_id: team_id.to_string(),
        },
        score,
        achieved_at: None,
    }
}

async fn open_pinball(setup: &TestSetup) -> HighScoreSession {
    setup
        .sessions
        .open_session(new_session(PINBALL, Some(top_two())))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_close_awards_placement_points() {
    let setup = TestSetupBuilder::new().build().await;
    let session = open_pinball(&setup).await;

    setup
        .sessions
        .submit_score(&session.id, by(TestSetup::carol(), 80.0))
        .await
        .unwrap();
    setup
        .sessions
        .submit_score(&session.id, by(TestSetup::alice(), 100.0))
        .await
        .unwrap();

    let (closed, entries) = setup.sessions.close_session(&session.id).await.unwrap();

    assert_eq!(closed.status, SessionStatus::Closed);
    assert!(closed.closed_at.is_some());
    let totals = points_by_team(&entries);
    assert_eq!(totals[RED], 10.0);
    assert_eq!(totals[BLUE], 5.0);
    assert!(entries.iter().all(|e| {
        e.source == SourceRef::for_session(&session.id)
            && e.category == PointCategory::HighScore
            && e.outcome == PointOutcome::Placement
    }));
}

#[tokio::test]
async fn test_team_with_two_scores_gets_only_its_best_placement() {
    let setup = TestSetupBuilder::new().build().await;
    let session = open_pinball(&setup).await;

    for submission in [
        by(TestSetup::alice(), 100.0),
        by(TestSetup::bob(), 90.0),
        by(TestSetup::carol(), 80.0),
    ] {
        setup
            .sessions
            .submit_score(&session.id, submission)
            .await
            .unwrap();
    }

    let (_, entries) = setup.sessions.close_session(&session.id).await.unwrap();

    // Blue's only score sits in third place, which has no configured reward
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_team_id, RED);
    assert_eq!(entries[0].points, 10.0);
    assert_eq!(entries[0].participants, vec![TestSetup::alice()]);
}

#[tokio::test]
async fn test_lowest_wins_with_team_owned_scores() {
    let setup = TestSetupBuilder::new().build().await;
    let session = setup
        .sessions
        .open_session(new_session(SPEEDRUN, Some(top_two())))
        .await
        .unwrap();

    setup
        .sessions
        .submit_score(&session.id, by_team(RED, 61.2))
        .await
        .unwrap();
    setup
        .sessions
        .submit_score(&session.id, by_team(BLUE, 58.9))
        .await
        .unwrap();

    let (_, entries) = setup.sessions.close_session(&session.id).await.unwrap();

    let totals = points_by_team(&entries);
    assert_eq!(totals[BLUE], 10.0);
    assert_eq!(totals[RED], 5.0);
    assert!(entries.iter().all(|e| e.participants.is_empty()));
}

#[tokio::test]
async fn test_tied_scores_go_to_the_earlier_submission() {
    let setup = TestSetupBuilder::new().build().await;
    let session = open_pinball(&setup).await;
    let noon = Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap();

    let mut late = by(TestSetup::alice(), 50.0);
    late.achieved_at = Some(noon + Duration::minutes(5));
    let mut early = by(TestSetup::carol(), 50.0);
    early.achieved_at = Some(noon);

    setup.sessions.submit_score(&session.id, late).await.unwrap();
    setup.sessions.submit_score(&session.id, early).await.unwrap();

    let standings = setup.sessions.session_standings(&session.id).await.unwrap();
    assert_eq!(standings[0].entry.event_team_id, BLUE);
    assert_eq!(standings[0].placement, 1);
    assert_eq!(standings[1].placement, 2);

    let (_, entries) = setup.sessions.close_session(&session.id).await.unwrap();
    assert_eq!(points_by_team(&entries)[BLUE], 10.0);
}

#[tokio::test]
async fn test_close_without_configuration_has_no_ledger_effect() {
    let setup = TestSetupBuilder::new().build().await;

    for config in [None, Some(vec![])] {
        let session = setup
            .sessions
            .open_session(new_session(PINBALL, config))
            .await
            .unwrap();
        setup
            .sessions
            .submit_score(&session.id, by(TestSetup::alice(), 10.0))
            .await
            .unwrap();

        let (closed, entries) = setup.sessions.close_session(&session.id).await.unwrap();
        assert_eq!(closed.status, SessionStatus::Closed);
        assert!(entries.is_empty());
    }

    assert_eq!(setup.store.point_entry_count().await, 0);
}

#[tokio::test]
async fn test_reopen_removes_only_the_sessions_points() {
    let setup = TestSetupBuilder::new().build().await;
    setup
        .ledger
        .create_award(NewAward {
            event_id: EVENT_ID.to_string(),
            name: "Team spirit".to_string(),
            points: 3.0,
            recipients: vec![GREEN.to_string()],
        })
        .await
        .unwrap();

    let speedrun = setup
        .sessions
        .open_session(new_session(SPEEDRUN, Some(top_two())))
        .await
        .unwrap();
    setup
        .sessions
        .submit_score(&speedrun.id, by_team(BLUE, 42.0))
        .await
        .unwrap();
    let (_, speedrun_entries) = setup.sessions.close_session(&speedrun.id).await.unwrap();

    let session = open_pinball(&setup).await;
    setup
        .sessions
        .submit_score(&session.id, by(TestSetup::alice(), 100.0))
        .await
        .unwrap();
    setup.sessions.close_session(&session.id).await.unwrap();
    assert_eq!(setup.store.point_entry_count().await, 3);

    let reopened = setup.sessions.reopen_session(&session.id).await.unwrap();

    assert_eq!(reopened.status, SessionStatus::Open);
    assert!(reopened.closed_at.is_none());
    assert!(setup
        .ledger
        .entries_for_source(&SourceRef::for_session(&session.id))
        .await
        .unwrap()
        .is_empty());

    let untouched = setup
        .ledger
        .entries_for_source(&SourceRef::for_session(&speedrun.id))
        .await
        .unwrap();
    assert_eq!(untouched, speedrun_entries);

    let remaining = setup.ledger.event_entries(EVENT_ID).await.unwrap();
    let totals = points_by_team(&remaining);
    assert_eq!(remaining.len(), 2);
    assert_eq!(totals[GREEN], 3.0);
    assert_eq!(totals[BLUE], 10.0);
}

#[tokio::test]
async fn test_concurrent_closes_place_the_session_once() {
    let setup = TestSetupBuilder::new().build().await;
    let session = open_pinball(&setup).await;
    setup
        .sessions
        .submit_score(&session.id, by(TestSetup::alice(), 100.0))
        .await
        .unwrap();
    setup
        .sessions
        .submit_score(&session.id, by(TestSetup::carol(), 80.0))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        setup.sessions.close_session(&session.id),
        setup.sessions.close_session(&session.id),
    );

    assert!(first.is_ok() != second.is_ok());
    let rejected = if first.is_ok() { second } else { first };
    assert_state_conflict(rejected);

    let entries = setup
        .ledger
        .entries_for_source(&SourceRef::for_session(&session.id))
        .await
        .unwrap();
    let totals = points_by_team(&entries);
    assert_eq!(entries.len(), 2);
    assert_eq!(totals[RED], 10.0);
    assert_eq!(totals[BLUE], 5.0);
}

#[tokio::test]
async fn test_reopen_and_close_recomputes_placements() {
    let setup = TestSetupBuilder::new().build().await;
    let session = open_pinball(&setup).await;
    setup
        .sessions
        .submit_score(&session.id, by(TestSetup::alice(), 100.0))
        .await
        .unwrap();
    setup
        .sessions
        .submit_score(&session.id, by(TestSetup::carol(), 80.0))
        .await
        .unwrap();
    setup.sessions.close_session(&session.id).await.unwrap();

    setup.sessions.reopen_session(&session.id).await.unwrap();
    setup
        .sessions
        .submit_score(&session.id, by(TestSetup::dave(), 120.0))
        .await
        .unwrap();
    let (_, entries) = setup.sessions.close_session(&session.id).await.unwrap();

    let totals = points_by_team(&entries);
    assert_eq!(totals[GREEN], 10.0);
    assert_eq!(totals[RED], 5.0);
    assert!(!totals.contains_key(BLUE));
    assert_eq!(setup.store.point_entry_count().await, 2);
}

#[tokio::test]
async fn test_lifecycle_transitions_are_enforced() {
    let setup = TestSetupBuilder::new().build().await;
    let session = open_pinball(&setup).await;
    let entry = setup
        .sessions
        .submit_score(&session.id, by(TestSetup::alice(), 100.0))
        .await
        .unwrap();

    assert_state_conflict(setup.sessions.reopen_session(&session.id).await);

    setup.sessions.close_session(&session.id).await.unwrap();

    assert_state_conflict(setup.sessions.close_session(&session.id).await);
    assert_state_conflict(
        setup
            .sessions
            .submit_score(&session.id, by(TestSetup::carol(), 1.0))
            .await,
    );
    assert_state_conflict(setup.sessions.delete_score(&entry.id).await);
}

#[tokio::test]
async fn test_deleted_score_is_not_placed() {
    let setup = TestSetupBuilder::new().build().await;
    let session = open_pinball(&setup).await;
    let mistake = setup
        .sessions
        .submit_score(&session.id, by(TestSetup::alice(), 9999.0))
        .await
        .unwrap();
    setup
        .sessions
        .submit_score(&session.id, by(TestSetup::carol(), 80.0))
        .await
        .unwrap();

    setup.sessions.delete_score(&mistake.id).await.unwrap();
    let (_, entries) = setup.sessions.close_session(&session.id).await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_team_id, BLUE);
    assert_eq!(entries[0].points, 10.0);
    assert_not_found(setup.sessions.delete_score(&mistake.id).await);
}

#[tokio::test]
async fn test_score_owner_must_match_game_type() {
    let setup = TestSetupBuilder::new().build().await;
    let pinball = open_pinball(&setup).await;
    let speedrun = setup
        .sessions
        .open_session(new_session(SPEEDRUN, None))
        .await
        .unwrap();

    assert_shape_conflict(
        setup
            .sessions
            .submit_score(&pinball.id, by_team(RED, 10.0))
            .await,
    );
    assert_shape_conflict(
        setup
            .sessions
            .submit_score(&speedrun.id, by(TestSetup::alice(), 10.0))
            .await,
    );
    assert_shape_conflict(
        setup
            .sessions
            .submit_score(&pinball.id, by(TestSetup::stranger(), 10.0))
            .await,
    );
    assert_not_found(
        setup
            .sessions
            .submit_score(&speedrun.id, by_team(OTHER_EVENT_TEAM, 10.0))
            .await,
    );
    assert_validation(
        setup
            .sessions
            .submit_score(&pinball.id, by(TestSetup::alice(), f64::NAN))
            .await,
    );
    assert_not_found(
        setup
            .sessions
            .submit_score("missing", by(TestSetup::alice(), 10.0))
            .await,
    );
}

#[tokio::test]
async fn test_open_session_checks_event_and_game_type() {
    let setup = TestSetupBuilder::new().build().await;

    assert_shape_conflict(
        setup
            .sessions
            .open_session(new_session(CHESS, Some(top_two())))
            .await,
    );
    assert_validation(
        setup
            .sessions
            .open_session(new_session(
                PINBALL,
                Some(vec![PlacementPoints {
                    placement: 0,
                    points: 10.0,
                }]),
            ))
            .await,
    );
    assert_not_found(
        setup
            .sessions
            .open_session(new_session("missing-game", None))
            .await,
    );

    let draft = TestSetupBuilder::new()
        .with_event_status(EventStatus::Draft)
        .build()
        .await;
    assert_state_conflict(draft.sessions.open_session(new_session(PINBALL, None)).await);
}

#[tokio::test]
async fn test_session_can_close_after_event_completes() {
    let setup = TestSetupBuilder::new().build().await;
    let session = open_pinball(&setup).await;
    setup
        .sessions
        .submit_score(&session.id, by(TestSetup::alice(), 100.0))
        .await
        .unwrap();

    setup
        .store
        .add_event(EventModel {
            id: EVENT_ID.to_string(),
            name: "Summer Games".to_string(),
            status: EventStatus::Completed,
        })
        .await;

    let (_, entries) = setup.sessions.close_session(&session.id).await.unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_delete_session_cascades() {
    let setup = TestSetupBuilder::new().build().await;
    let session = open_pinball(&setup).await;
    setup
        .sessions
        .submit_score(&session.id, by(TestSetup::alice(), 100.0))
        .await
        .unwrap();
    setup.sessions.close_session(&session.id).await.unwrap();

    setup.sessions.delete_session(&session.id).await.unwrap();

    assert_eq!(setup.store.point_entry_count().await, 0);
    assert_not_found(setup.sessions.get_session(&session.id).await);
    assert_not_found(setup.sessions.session_standings(&session.id).await);
    assert_not_found(setup.sessions.delete_session(&session.id).await);
}
