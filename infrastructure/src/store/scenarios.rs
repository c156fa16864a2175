//! End-to-end session scenarios on the in-memory store.
//!
//! These wire the real adapters together the way the binary does, with two
//! use case stacks sharing one store and one broker to stand in for two
//! service processes.

use super::InMemoryStore;
use crate::broker::InProcessBroker;
use crate::generator::SampleItineraryGenerator;
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use vibecation_application::{
    CastVoteInput, CastVoteUseCase, ChatHub, ChatService, CompletePhaseUseCase, CompletionAction,
    DecisionFinalizer, LocalSubscriberRegistry, NewTrip, OptionDerivation, OptionStore,
    PollUseCase, SessionParams, SuggestionUseCase, TripUseCase, VoteStore,
};
use vibecation_domain::{
    DomainError, MessageId, OptionKind, Phase, Polarity, ServerFrame, TripId, TripStatus, UserId,
    VoteOption,
};

/// Counts runs of the wrapped action.
struct Counted {
    inner: Arc<dyn CompletionAction>,
    runs: AtomicUsize,
}

impl Counted {
    fn wrap(inner: Arc<dyn CompletionAction>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            runs: AtomicUsize::new(0),
        })
    }

    fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionAction for Counted {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn run(&self, trip_id: &TripId) -> Result<(), DomainError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.inner.run(trip_id).await
    }
}

fn users(names: &[&str]) -> Vec<UserId> {
    names.iter().map(|n| UserId::new(*n)).collect()
}

async fn create_trip(store: &Arc<InMemoryStore>, owner: &str, members: &[&str]) -> TripId {
    TripUseCase::new(store.clone())
        .create_trip(
            &UserId::new(owner),
            NewTrip {
                title: "Iberia".into(),
                members: users(members),
                ..NewTrip::default()
            },
        )
        .await
        .unwrap()
        .id
}

async fn score(polls: &PollUseCase, trip: &TripId) -> (u64, u64, i64) {
    let ranked = polls.ranked_options(trip, OptionKind::Activity).await.unwrap();
    (ranked[0].upvotes, ranked[0].downvotes, ranked[0].net_score)
}

#[tokio::test]
async fn test_two_member_vote_scenario() {
    let store = Arc::new(InMemoryStore::new());
    let trip = create_trip(&store, "member1", &["member2"]).await;
    store
        .replace_options(
            &trip,
            vec![VoteOption::new("opt_A", OptionKind::Activity, "Sagrada Familia", 1)],
        )
        .await
        .unwrap();

    let votes = CastVoteUseCase::new(store.clone(), store.clone(), store.clone(), store.clone());
    let polls = PollUseCase::new(store.clone(), store.clone(), store.clone());
    let cast = |user: &str, polarity| {
        CastVoteInput::new(trip.clone(), user, "opt_A", OptionKind::Activity, polarity)
    };

    votes.execute(cast("member1", Polarity::Up)).await.unwrap();
    assert_eq!(score(&polls, &trip).await, (1, 0, 1));
    votes.execute(cast("member2", Polarity::Down)).await.unwrap();
    assert_eq!(score(&polls, &trip).await, (1, 1, 0));
    votes.execute(cast("member1", Polarity::Down)).await.unwrap();
    assert_eq!(score(&polls, &trip).await, (0, 2, -2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_votes_keep_tally_consistent_with_ledger() {
    let store = Arc::new(InMemoryStore::new());
    let members = ["a", "b", "c"];
    let trip = create_trip(&store, "a", &members).await;
    store
        .replace_options(
            &trip,
            vec![VoteOption::new("opt_A", OptionKind::Location, "Lisbon", 1)],
        )
        .await
        .unwrap();

    let params = SessionParams::default().with_max_cas_retries(10_000);
    let votes = Arc::new(
        CastVoteUseCase::new(store.clone(), store.clone(), store.clone(), store.clone())
            .with_params(&params),
    );

    let mut tasks = Vec::new();
    for member in members {
        for n in 0..25 {
            let votes = votes.clone();
            let trip = trip.clone();
            let polarity = if n % 3 == 0 { Polarity::Down } else { Polarity::Up };
            tasks.push(tokio::spawn(async move {
                votes
                    .execute(CastVoteInput::new(
                        trip,
                        member,
                        "opt_A",
                        OptionKind::Location,
                        polarity,
                    ))
                    .await
            }));
        }
    }
    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    let mut expected_up = 0;
    let mut expected_down = 0;
    for member in members {
        let mine = store
            .polarities(&trip, &UserId::new(member), OptionKind::Location)
            .await
            .unwrap();
        assert!(mine.len() <= 1);
        match mine.values().next() {
            Some(Polarity::Up) => expected_up += 1,
            Some(Polarity::Down) => expected_down += 1,
            None => {}
        }
    }

    let tallies = store.tallies(&trip, OptionKind::Location).await.unwrap();
    let tally = tallies.values().next().copied().unwrap_or_default();
    assert_eq!(tally.upvotes, expected_up);
    assert_eq!(tally.downvotes, expected_down);
    assert_eq!(tally.net_score(), expected_up as i64 - expected_down as i64);
}

#[tokio::test]
async fn test_zero_completions_status() {
    let store = Arc::new(InMemoryStore::new());
    let trip = create_trip(&store, "a", &["b", "c"]).await;
    let gate = CompletePhaseUseCase::new(store.clone(), store.clone());

    let status = gate.phase_status(&trip, Phase::Brainstorm).await.unwrap();
    assert_eq!(status.completed_count, 0);
    assert_eq!(status.total_members, 3);
    assert!(!status.phase_complete);
}

/// One "process": its own use case stack over the shared store.
struct Node {
    suggestions: SuggestionUseCase,
    votes: CastVoteUseCase,
    gate: CompletePhaseUseCase,
    finalizer: Arc<DecisionFinalizer>,
}

fn node(store: &Arc<InMemoryStore>, derive: Arc<Counted>, decide: Arc<Counted>) -> Node {
    let polls = Arc::new(PollUseCase::new(store.clone(), store.clone(), store.clone()));
    let generator = SampleItineraryGenerator::new()
        .with_start_date(NaiveDate::from_ymd_opt(2026, 7, 1).unwrap());
    Node {
        suggestions: SuggestionUseCase::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(generator),
        ),
        votes: CastVoteUseCase::new(store.clone(), store.clone(), store.clone(), store.clone()),
        gate: CompletePhaseUseCase::new(store.clone(), store.clone())
            .with_action(Phase::Brainstorm, derive)
            .with_action(Phase::Polling, decide),
        finalizer: Arc::new(DecisionFinalizer::new(store.clone(), polls, store.clone())),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_session_runs_each_action_exactly_once() {
    let store = Arc::new(InMemoryStore::new());
    let trip = create_trip(&store, "a", &["b", "c"]).await;

    let derivation: Arc<dyn CompletionAction> =
        Arc::new(OptionDerivation::new(store.clone(), store.clone()));
    let derive = Counted::wrap(derivation);
    let polls = Arc::new(PollUseCase::new(store.clone(), store.clone(), store.clone()));
    let finalizer: Arc<dyn CompletionAction> =
        Arc::new(DecisionFinalizer::new(store.clone(), polls.clone(), store.clone()));
    let decide = Counted::wrap(finalizer);

    let nodes = Arc::new([
        node(&store, derive.clone(), decide.clone()),
        node(&store, derive.clone(), decide.clone()),
    ]);

    // Brainstorm: every member drafts and submits.
    for (member, query) in [
        ("a", "2 days in Lisbon"),
        ("b", "2 days in Porto"),
        ("c", "2 days in Lisbon"),
    ] {
        let user = UserId::new(member);
        nodes[0]
            .suggestions
            .generate_draft(&trip, &user, query)
            .await
            .unwrap();
        nodes[1].suggestions.submit(&trip, &user).await.unwrap();
    }

    // Members finish on alternating nodes at the same time.
    let marks = ["a", "b", "c"].into_iter().enumerate().map(|(i, member)| {
        let nodes = nodes.clone();
        let trip = trip.clone();
        tokio::spawn(async move {
            nodes[i % 2]
                .gate
                .mark_complete(&trip, &UserId::new(member), Phase::Brainstorm)
                .await
        })
    });
    for result in join_all(marks).await {
        result.unwrap().unwrap();
    }
    assert_eq!(derive.runs(), 1);

    let activities = polls.ranked_options(&trip, OptionKind::Activity).await.unwrap();
    let locations = polls.ranked_options(&trip, OptionKind::Location).await.unwrap();
    // Two destinations, two days, two activities per day.
    assert_eq!(activities.len(), 8);
    assert_eq!(locations.len(), 2);

    // Authoring is closed once options exist.
    assert!(matches!(
        nodes[0]
            .suggestions
            .generate_draft(&trip, &UserId::new("a"), "one more day")
            .await,
        Err(DomainError::PhaseClosed { .. })
    ));

    let top = activities[0].option_id.clone();
    for member in ["a", "b", "c"] {
        nodes[1]
            .votes
            .execute(CastVoteInput::new(
                trip.clone(),
                member,
                top.clone(),
                OptionKind::Activity,
                Polarity::Up,
            ))
            .await
            .unwrap();
    }

    for member in ["a", "b", "c"] {
        nodes[0]
            .gate
            .mark_complete(&trip, &UserId::new(member), Phase::Polling)
            .await
            .unwrap();
    }
    // Repeat marks after finalize are no-ops.
    nodes[1]
        .gate
        .mark_complete(&trip, &UserId::new("a"), Phase::Polling)
        .await
        .unwrap();
    assert_eq!(decide.runs(), 1);

    let snapshot = nodes[1].finalizer.snapshot(&trip).await.unwrap();
    assert_eq!(snapshot.top_activities[0].option_id, top);
    assert_eq!(snapshot.top_activities[0].net_score, 3);
    assert_eq!(snapshot.total_votes, 3);
    assert_eq!(store_status(&store, &trip).await, TripStatus::Decided);

    // Re-finalizing from another node reproduces the same bytes.
    let again = nodes[0].finalizer.finalize(&trip).await.unwrap();
    assert_eq!(
        snapshot.to_canonical_json().unwrap(),
        again.to_canonical_json().unwrap()
    );

    // Votes are frozen after polling is finalized.
    assert!(matches!(
        nodes[0]
            .votes
            .execute(CastVoteInput::new(
                trip.clone(),
                "a",
                top,
                OptionKind::Activity,
                Polarity::Down,
            ))
            .await,
        Err(DomainError::PhaseClosed { .. })
    ));
}

async fn store_status(store: &Arc<InMemoryStore>, trip: &TripId) -> TripStatus {
    use vibecation_application::MembershipDirectory;
    store.trip(trip).await.unwrap().unwrap().status
}

#[tokio::test]
async fn test_chat_across_two_hubs_with_catch_up() {
    let store = Arc::new(InMemoryStore::new());
    let trip = create_trip(&store, "a", &["b"]).await;
    let broker = Arc::new(InProcessBroker::new(64));
    let cancel = CancellationToken::new();

    let registry_one = Arc::new(LocalSubscriberRegistry::new());
    let registry_two = Arc::new(LocalSubscriberRegistry::new());
    let hub_one = ChatHub::spawn(broker.as_ref(), registry_one.clone(), cancel.child_token());
    let hub_two = ChatHub::spawn(broker.as_ref(), registry_two.clone(), cancel.child_token());
    let service_one = ChatService::new(store.clone(), store.clone(), broker.clone(), registry_one);
    let service_two = ChatService::new(store.clone(), store.clone(), broker.clone(), registry_two);

    let a = UserId::new("a");
    for n in 1..=7 {
        service_one.send(&trip, &a, &format!("m{}", n), None).await.unwrap();
    }

    // Reconnect on the other node after having seen message 5.
    let mut conn = service_two
        .connect(&trip, &UserId::new("b"), Some(MessageId::new(5)))
        .await
        .unwrap();
    let mut frames = Vec::new();
    for n in 0..4 {
        if n == 3 {
            service_one.send(&trip, &a, "m8", None).await.unwrap();
        }
        let frame = tokio::time::timeout(Duration::from_secs(2), conn.next_frame())
            .await
            .unwrap()
            .unwrap();
        frames.push(frame);
    }
    match &frames[0] {
        ServerFrame::Welcome {
            last_message_id, ..
        } => assert_eq!(*last_message_id, MessageId::new(7)),
        other => panic!("unexpected {:?}", other),
    }
    let ids: Vec<u64> = frames[1..]
        .iter()
        .filter_map(|f| f.message_id().map(|id| id.value()))
        .collect();
    assert_eq!(ids, vec![6, 7, 8]);

    let history = service_two.history(&trip, Some(MessageId::new(5)), None).await.unwrap();
    assert_eq!(history.len(), 3);

    hub_one.shutdown().await;
    hub_two.shutdown().await;
}
