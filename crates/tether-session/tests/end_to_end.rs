// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end flows through dispatcher, correlator, and sessions.

use std::sync::Arc;
use std::time::Duration;

use tether_core::{ChatId, ParseMode, Role, User, UserId};
use tether_session::{
    AuthCorrelator, AuthLinks, CallbackOutcome, CommandTable, CorrelationToken, Dispatcher, Nonce,
    RejectReason, SessionRegistry, SessionServices, SessionState,
};
use tether_test_utils::{MemoryUserStore, MockSender, MockVerifier, SentMessage, private_message};
use url::Url;

const WAIT: Duration = Duration::from_secs(5);

struct Bot {
    nonce: Arc<Nonce>,
    sender: Arc<MockSender>,
    store: Arc<MemoryUserStore>,
    verifier: Arc<MockVerifier>,
    registry: SessionRegistry,
    dispatcher: Dispatcher,
    correlator: AuthCorrelator,
}

fn bot() -> Bot {
    let nonce = Arc::new(Nonce::generate());
    let sender = Arc::new(MockSender::new());
    let store = Arc::new(MemoryUserStore::new());
    let verifier = Arc::new(
        MockVerifier::new()
            .with_code("code-1001", 1001)
            .with_code("code-1002", 1002)
            .with_code("code-2002", 2002),
    );
    let registry = SessionRegistry::new();
    let services = SessionServices {
        sender: sender.clone(),
        store: store.clone(),
        commands: Arc::new(CommandTable::new()),
    };
    let links = AuthLinks::new(
        Url::parse("https://id.example.com/protocol/openid-connect/auth").unwrap(),
        "tether",
        "http://localhost:8080/auth/itmoid/callback",
        vec!["openid".to_string()],
        Arc::clone(&nonce),
    );
    let dispatcher = Dispatcher::new(registry.clone(), sender.clone(), links);
    let correlator = AuthCorrelator::new(
        Arc::clone(&nonce),
        verifier.clone(),
        services,
        registry.clone(),
        1,
    );
    Bot {
        nonce,
        sender,
        store,
        verifier,
        registry,
        dispatcher,
        correlator,
    }
}

/// Pull the `state` parameter out of an authentication link message.
fn state_from_link(message: &SentMessage) -> String {
    let start = message.text.find("href=\"").expect("link has href") + "href=\"".len();
    let end = start + message.text[start..].find('"').expect("href is closed");
    let href = message.text[start..end].replace("&amp;", "&");
    let url = Url::parse(&href).expect("href is a URL");
    url.query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .expect("link carries state")
}

impl Bot {
    async fn last_sent(&self) -> SentMessage {
        self.sender
            .sent_messages()
            .await
            .pop()
            .expect("something was sent")
    }

    /// `/start` from `chat`, then the provider redirect with `code`.
    async fn login(&self, chat: i64, first_name: &str, code: &str) -> CallbackOutcome {
        self.dispatcher
            .handle(private_message(chat, first_name, "/start"))
            .await;
        let link = self.last_sent().await;
        let state = state_from_link(&link);
        self.correlator.complete(Some(code), Some(&state)).await
    }

    async fn say(&self, chat: i64, first_name: &str, text: &str) {
        self.dispatcher
            .handle(private_message(chat, first_name, text))
            .await;
    }

    /// `/hello` replies sent to `chat`, in order.
    async fn greetings(&self, chat: i64) -> Vec<String> {
        self.sender
            .texts_for(ChatId(chat))
            .await
            .into_iter()
            .filter(|t| t.starts_with("Hello, "))
            .collect()
    }

    async fn wait_for(&self, count: usize) -> Vec<SentMessage> {
        let sent = self.sender.wait_for_messages(count, WAIT).await;
        assert!(sent.len() >= count, "expected {count} messages, got {sent:?}");
        sent
    }
}

#[tokio::test]
async fn start_callback_then_hello_greets_with_subject() {
    let bot = bot();
    bot.store
        .seed(User {
            id: UserId(1001),
            name: "Alice Smith".into(),
            phone_number: None,
            role: Role::User,
        })
        .await;

    bot.say(42, "Alice", "/start").await;
    let link = bot.last_sent().await;
    assert_eq!(link.chat, ChatId(42));
    assert_eq!(link.mode, ParseMode::Html);
    let state = state_from_link(&link);
    let token = CorrelationToken::verify(&state, &bot.nonce).expect("token from our process");
    assert_eq!(token.chat, ChatId(42));
    assert_eq!(token.first_name, "Alice");

    let outcome = bot.correlator.complete(Some("code-1001"), Some(&state)).await;
    assert_eq!(
        outcome,
        CallbackOutcome::SessionOpened {
            chat: ChatId(42),
            subject: UserId(1001)
        }
    );
    assert_eq!(bot.registry.subject(ChatId(42)), Some(UserId(1001)));
    assert_eq!(bot.registry.state(ChatId(42)), Some(SessionState::Running));

    bot.say(42, "Alice", "/hello").await;
    let sent = bot.wait_for(3).await;
    assert_eq!(
        sent[1].text,
        "Hello with isu number 1001. I added you to my database."
    );
    assert_eq!(sent[2].text, "Hello, Alice [1001]");
    assert_eq!(sent[2].chat, ChatId(42));
}

#[tokio::test]
async fn foreign_nonce_opens_nothing() {
    let bot = bot();
    let forged = CorrelationToken::new(&Nonce::generate(), ChatId(42), "Mallory", "").encode();

    let outcome = bot.correlator.complete(Some("code-1001"), Some(&forged)).await;

    assert_eq!(outcome, CallbackOutcome::Rejected(RejectReason::NonceMismatch));
    assert!(bot.registry.is_empty());
    assert_eq!(bot.sender.sent_count().await, 0);
    assert_eq!(bot.store.writes(), 0);
    assert_eq!(bot.verifier.calls(), 0);
}

#[tokio::test]
async fn phone_prompt_then_bad_answer_reports_and_recovers() {
    let bot = bot();
    bot.login(42, "Alice", "code-1001").await;
    bot.wait_for(2).await;

    bot.say(42, "Alice", "/phone").await;
    let sent = bot.wait_for(3).await;
    assert_eq!(sent[2].text, "Enter a phone number in format '+x (xxx) xxx-xx-xx'");

    bot.say(42, "Alice", "not a phone").await;
    let sent = bot.wait_for(4).await;
    assert_eq!(sent[3].text, "Phone format did not match, please try again");

    bot.say(42, "Alice", "/hello").await;
    let sent = bot.wait_for(5).await;
    assert_eq!(sent[4].text, "Hello, Alice [1001]");
}

#[tokio::test]
async fn command_sent_during_prompt_is_taken_as_the_answer() {
    let bot = bot();
    bot.login(42, "Alice", "code-1001").await;
    bot.wait_for(2).await;

    bot.say(42, "Alice", "/phone").await;
    let sent = bot.wait_for(3).await;
    assert_eq!(sent[2].text, "Enter a phone number in format '+x (xxx) xxx-xx-xx'");

    bot.say(42, "Alice", "/hello").await;
    let sent = bot.wait_for(4).await;
    assert_eq!(sent[3].text, "Phone format did not match, please try again");

    let mut state = bot.registry.watch(ChatId(42)).expect("session still registered");
    tokio::time::timeout(WAIT, state.wait_for(|s| *s == SessionState::Running))
        .await
        .expect("loop returns to running")
        .expect("session alive");
    assert!(bot.greetings(42).await.is_empty());
    assert_eq!(bot.sender.sent_count().await, 4);
}

#[tokio::test]
async fn phone_with_argument_is_saved() {
    let bot = bot();
    bot.login(42, "Alice", "code-1001").await;
    bot.wait_for(2).await;

    bot.say(42, "Alice", "/phone +7 (911) 123-45-67").await;
    let sent = bot.wait_for(3).await;
    assert_eq!(sent[2].text, "Phone number saved");

    let user = bot.store.get(UserId(1001)).await.expect("user stored at login");
    assert_eq!(user.phone_number.as_deref(), Some("+7 (911) 123-45-67"));
}

#[tokio::test]
async fn interleaved_chats_keep_their_own_order() {
    let bot = bot();
    bot.login(1, "a0", "code-1001").await;
    bot.login(2, "b0", "code-2002").await;
    bot.wait_for(4).await;

    let script = [
        (1, "a1"),
        (2, "b1"),
        (1, "a2"),
        (1, "a3"),
        (2, "b2"),
        (2, "b3"),
        (1, "a4"),
    ];
    for (chat, name) in script {
        bot.say(chat, name, "/hello").await;
    }
    bot.wait_for(4 + script.len()).await;

    assert_eq!(
        bot.greetings(1).await,
        vec![
            "Hello, a1 [1001]",
            "Hello, a2 [1001]",
            "Hello, a3 [1001]",
            "Hello, a4 [1001]"
        ]
    );
    assert_eq!(
        bot.greetings(2).await,
        vec!["Hello, b1 [2002]", "Hello, b2 [2002]", "Hello, b3 [2002]"]
    );
}

#[tokio::test]
async fn unknown_command_replies_without_writing() {
    let bot = bot();
    bot.login(42, "Alice", "code-1001").await;
    bot.wait_for(2).await;
    let writes = bot.store.writes();

    bot.say(42, "Alice", "/frobnicate now").await;
    let sent = bot.wait_for(3).await;

    assert_eq!(sent[2].text, "I don't know this command");
    assert_eq!(bot.store.writes(), writes);
}

#[tokio::test]
async fn handler_error_leaves_loop_running() {
    let bot = bot();
    bot.login(42, "Alice", "code-1001").await;
    bot.wait_for(2).await;

    bot.say(42, "Alice", "/phone 12345").await;
    let sent = bot.wait_for(3).await;
    assert_eq!(sent[2].text, "Phone format did not match, please try again");
    let mut state = bot.registry.watch(ChatId(42)).expect("session still registered");
    tokio::time::timeout(WAIT, state.wait_for(|s| *s == SessionState::Running))
        .await
        .expect("loop returns to running")
        .expect("session alive");

    bot.say(42, "Alice", "/hello").await;
    let sent = bot.wait_for(4).await;
    assert_eq!(sent[3].text, "Hello, Alice [1001]");
}

#[tokio::test]
async fn search_renders_html_table() {
    let bot = bot();
    bot.store
        .seed(User {
            id: UserId(7),
            name: "Bob <Builder>".into(),
            phone_number: None,
            role: Role::User,
        })
        .await;
    bot.login(42, "Alice", "code-1001").await;
    bot.wait_for(2).await;

    bot.say(42, "Alice", "/search bob").await;
    let sent = bot.wait_for(3).await;
    let table = &sent[2];
    assert_eq!(table.mode, ParseMode::Html);
    assert!(table.text.starts_with("<pre>") && table.text.ends_with("</pre>"));
    assert!(table.text.contains("Bob &lt;Builder&gt;"));
    assert!(table.text.contains("Unset"));

    bot.say(42, "Alice", "/search nobody").await;
    let sent = bot.wait_for(4).await;
    assert_eq!(sent[3].text, "No users found");
}

#[tokio::test]
async fn second_login_replaces_and_closes_first_session() {
    let bot = bot();
    bot.login(42, "Alice", "code-1001").await;
    let mut old_state = bot.registry.watch(ChatId(42)).expect("first session");

    let outcome = bot.login(42, "Alice", "code-1002").await;
    assert_eq!(
        outcome,
        CallbackOutcome::SessionOpened {
            chat: ChatId(42),
            subject: UserId(1002)
        }
    );
    assert_eq!(bot.registry.len(), 1);
    assert_eq!(bot.registry.subject(ChatId(42)), Some(UserId(1002)));

    tokio::time::timeout(WAIT, old_state.wait_for(|s| *s == SessionState::Closed))
        .await
        .expect("old session closes")
        .expect("state observable until close");

    bot.say(42, "Alice", "/hello").await;
    let sent = bot.wait_for(5).await;
    assert_eq!(sent[4].text, "Hello, Alice [1002]");
}

#[tokio::test]
async fn closing_session_mid_prompt_sends_no_error() {
    let bot = bot();
    bot.login(42, "Alice", "code-1001").await;
    bot.wait_for(2).await;

    bot.say(42, "Alice", "/phone").await;
    bot.wait_for(3).await;
    let mut state = bot.registry.watch(ChatId(42)).unwrap();
    assert_eq!(*state.borrow_and_update(), SessionState::Dispatching);

    let handle = bot.registry.remove(ChatId(42)).unwrap();
    tokio::time::timeout(WAIT, handle.close())
        .await
        .expect("loop exits")
        .expect("loop does not panic");

    assert_eq!(*state.borrow(), SessionState::Closed);
    assert_eq!(bot.sender.sent_count().await, 3);
}
