//! End-to-end tests: a real server on a loopback port, driven through the
//! HTTP client backend and the session controller.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use secret_santa::api::build_app;
use secret_santa::app_state::AppState;
use secret_santa::client::{
    ClientConfig, ClientError, ExchangeBackend, GiftDraft, HttpBackend, Identity, IdentityStore,
    Notice, Session, StorageConfig,
};
use secret_santa::domain::{
    DeliveryStatus, GiftImage, HIDDEN_SENDER_LABEL, NewGift, ParticipantId, PasscodeGate,
};
use secret_santa::service::ExchangeService;
use secret_santa::store::{ExchangeStore, MemoryStore};
use tokio_test::{assert_err, assert_ok};

const PASSCODE: &str = "north-pole";

struct Harness {
    backend: Arc<HttpBackend>,
    dir: tempfile::TempDir,
}

impl Harness {
    async fn start() -> Self {
        let gate = assert_ok!(PasscodeGate::new(PASSCODE));
        let store: Arc<dyn ExchangeStore> = Arc::new(MemoryStore::new("Office Party"));
        let state = AppState {
            exchange_service: Arc::new(ExchangeService::new(store, gate)),
        };
        let app = build_app(state, Duration::from_secs(5));

        let listener = assert_ok!(tokio::net::TcpListener::bind("127.0.0.1:0").await);
        let addr = assert_ok!(listener.local_addr());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let backend = assert_ok!(HttpBackend::new(&ClientConfig::new(format!("http://{addr}"))));
        Self {
            backend: Arc::new(backend),
            dir: assert_ok!(tempfile::tempdir()),
        }
    }

    async fn session(&self, name: &str) -> Session {
        let storage = StorageConfig::in_dir(self.dir.path().join(name));
        let backend: Arc<dyn ExchangeBackend> = Arc::clone(&self.backend) as Arc<dyn ExchangeBackend>;
        let mut session = Session::new(backend, IdentityStore::new(&storage));
        let notice = session.join(PASSCODE, name).await;
        assert!(notice.is_success(), "{name} could not join: {notice:?}");
        session
    }
}

fn me(session: &Session) -> Identity {
    let Some(identity) = session.identity() else {
        panic!("session has no identity");
    };
    identity.clone()
}

fn draft_for(to: ParticipantId) -> GiftDraft {
    GiftDraft {
        recipient: Some(to),
        status: DeliveryStatus::Delivered,
        images: vec![GiftImage::from_url("https://img.example/scarf.png")],
        message: "Stay warm!".to_string(),
    }
}

#[tokio::test]
async fn unlocked_gift_shows_contents_but_hides_sender() {
    let harness = Harness::start().await;
    let mut bob = harness.session("Bob").await;
    let mut alice = harness.session("Alice").await;
    let bob_id = me(&bob).participant_id;

    assert!(alice.add_gift(draft_for(bob_id)).await.is_success());
    assert_ok!(bob.refresh().await);
    let Some(wrapped) = bob.gifts().first() else {
        panic!("bob sees no gift");
    };
    assert!(wrapped.images.is_none());
    assert!(wrapped.message.is_none());
    assert!(wrapped.sender_id.is_none());
    let gift_id = wrapped.id;

    assert_eq!(
        alice.toggle_lock(gift_id).await,
        Notice::Success("Gift revealed to Bob! 🎄".to_string())
    );
    assert_ok!(bob.refresh().await);
    let Some(unwrapped) = bob.gifts().first() else {
        panic!("bob lost the gift");
    };
    assert_eq!(unwrapped.message.as_deref(), Some("Stay warm!"));
    assert!(unwrapped.images.as_ref().is_some_and(|i| i.len() == 1));
    assert!(unwrapped.sender_id.is_none());

    let cards = bob.cards();
    let Some(card) = cards.first() else {
        panic!("no card");
    };
    assert_eq!(card.sender_label, HIDDEN_SENDER_LABEL);
    assert_eq!(card.recipient_label, "Bob");
    assert!(card.is_for_me);
    assert!(!card.actions.can_delete);
}

#[tokio::test]
async fn reveal_waits_for_everyone_then_shows_senders() {
    let harness = Harness::start().await;
    let mut alice = harness.session("Alice").await;
    let mut bob = harness.session("Bob").await;
    let mut carol = harness.session("Carol").await;
    let bob_id = me(&bob).participant_id;
    let alice_id = me(&alice).participant_id;

    assert_ok!(alice.refresh().await);
    assert!(alice.add_gift(draft_for(bob_id)).await.is_success());
    assert!(alice.set_ready(true).await.is_success());
    assert!(bob.set_ready(true).await.is_success());

    let notice = alice.end_event().await;
    assert!(matches!(notice, Notice::NotYet(ref m) if m.contains("2/3")), "{notice:?}");
    assert!(!alice.is_revealed());

    assert!(carol.set_ready(true).await.is_success());
    assert!(carol.end_event().await.is_success());
    assert!(carol.is_revealed());

    assert_ok!(bob.refresh().await);
    assert!(bob.is_revealed());
    let Some(gift) = bob.gifts().first() else {
        panic!("gift missing after reveal");
    };
    assert_eq!(gift.sender_id, Some(alice_id));
    assert!(gift.images.is_some());

    assert_ok!(alice.refresh().await);
    let late = alice.add_gift(draft_for(bob_id)).await;
    assert!(matches!(late, Notice::Invalid(_)), "{late:?}");
    assert!(alice.end_event().await.is_success());
}

#[tokio::test]
async fn only_the_sender_can_delete() {
    let harness = Harness::start().await;
    let bob = harness.session("Bob").await;
    let alice = harness.session("Alice").await;
    let (alice_me, bob_me) = (me(&alice), me(&bob));

    let gift = assert_ok!(
        harness
            .backend
            .add_gift(
                &alice_me,
                NewGift {
                    to: bob_me.participant_id,
                    status: DeliveryStatus::Pending,
                    images: Vec::new(),
                    message: None,
                    is_unlocked: false,
                },
            )
            .await
    );

    let err = assert_err!(harness.backend.delete_gift(&bob_me, gift.id).await);
    assert!(matches!(err, ClientError::Forbidden(_)), "{err:?}");
    let err = assert_err!(harness.backend.toggle_lock(&bob_me, gift.id).await);
    assert!(matches!(err, ClientError::Forbidden(_)), "{err:?}");

    let gifts = assert_ok!(harness.backend.gifts(None).await);
    assert_eq!(gifts.len(), 1);
    assert!(gifts.first().is_some_and(|g| !g.is_unlocked && g.sender_id.is_none()));

    assert_ok!(harness.backend.delete_gift(&alice_me, gift.id).await);
    assert!(assert_ok!(harness.backend.gifts(None).await).is_empty());
}

#[tokio::test]
async fn joining_checks_passcode_and_name() {
    let harness = Harness::start().await;
    let _alice = harness.session("Alice").await;

    let err = assert_err!(harness.backend.join("wrong", "Bob").await);
    assert!(err.is_auth(), "{err:?}");

    let err = assert_err!(harness.backend.join(PASSCODE, "  alice ").await);
    assert!(matches!(err, ClientError::Conflict(_)), "{err:?}");

    let roster = assert_ok!(harness.backend.participants().await);
    assert_eq!(roster.len(), 1);
}

#[tokio::test]
async fn leaving_removes_participant_and_their_gifts() {
    let harness = Harness::start().await;
    let mut bob = harness.session("Bob").await;
    let mut alice = harness.session("Alice").await;
    let bob_me = me(&bob);

    assert!(alice.add_gift(draft_for(bob_me.participant_id)).await.is_success());
    assert!(bob.leave().await.is_success());
    assert!(bob.identity().is_none());

    assert_ok!(alice.refresh().await);
    assert_eq!(alice.participants().len(), 1);
    assert!(alice.gifts().is_empty());

    let err = assert_err!(harness.backend.gifts(Some(&bob_me)).await);
    assert!(err.is_auth(), "{err:?}");
}

#[tokio::test]
async fn stale_identity_reports_expired_session() {
    let harness = Harness::start().await;
    let mut alice = harness.session("Alice").await;
    let alice_me = me(&alice);
    assert_ok!(harness.backend.leave(&alice_me).await);

    let notice = alice.set_ready(true).await;
    assert_eq!(
        notice,
        Notice::Failure("Session expired. Please re-join the event.".to_string())
    );
}
