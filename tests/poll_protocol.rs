mod common;

use uuid::Uuid;

use poll_backend::models::{CreatePollData, OptionData};
use poll_backend::poll::{self, duplicate_option, OTHER_USER_POLL, PUBLISHED_POLL};
use poll_backend::AppError;

use common::{poll_with_options, registered, services};

fn value(v: impl Into<String>) -> OptionData {
    OptionData { value: v.into() }
}

fn assert_not_change(err: AppError, message: &str) {
    match err {
        AppError::NotChangePoll(m) => assert_eq!(m, message),
        other => panic!("expected NotChangePoll({message}), got {other:?}"),
    }
}

#[tokio::test]
async fn create_poll_belongs_to_caller() {
    let services = services();
    let owner = registered(&services, "candace").await;

    let created = poll::start_create_poll(
        &services,
        &owner,
        CreatePollData {
            name: "Summer plans".into(),
        },
    )
    .await
    .unwrap();

    assert_eq!(created.owner, owner.user.id);
    assert!(!created.published);
    assert!(created.options.is_empty());

    let mine = poll::get_polls_mine(&services, &owner).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].name, "Summer plans");
}

#[tokio::test]
async fn added_option_is_read_back() {
    let services = services();
    let owner = registered(&services, "candace").await;
    let created = poll_with_options(&services, &owner, &[]).await;
    let id = created.id.to_string();

    let changed = poll::add_option(&services, &owner, &id, value("Blue")).await.unwrap();
    assert_eq!(changed.options.len(), 1);

    let read = poll::get_poll(&services, &id).await.unwrap();
    let contents: Vec<_> = read.options.iter().map(|o| o.content.as_str()).collect();
    assert_eq!(contents, vec!["Blue"]);
}

#[tokio::test]
async fn remove_option_deletes_by_id() {
    let services = services();
    let owner = registered(&services, "candace").await;
    let created = poll_with_options(&services, &owner, &["Red", "Blue"]).await;
    let id = created.id.to_string();
    let red = created.options[0].id.to_string();

    let changed = poll::remove_option(&services, &owner, &id, value(red)).await.unwrap();
    assert_eq!(changed.options.len(), 1);

    let read = poll::get_poll(&services, &id).await.unwrap();
    assert_eq!(read.options.len(), 1);
    assert_eq!(read.options[0].content, "Blue");
}

#[tokio::test]
async fn removing_unknown_option_surfaces_the_lookup_error() {
    let services = services();
    let owner = registered(&services, "candace").await;
    let created = poll_with_options(&services, &owner, &["Red"]).await;

    let err = poll::remove_option(
        &services,
        &owner,
        &created.id.to_string(),
        value(Uuid::from_u128(999).to_string()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::NotFound(ref m) if m == "poll option not found"));
}

#[tokio::test]
async fn removing_with_malformed_option_id_fails() {
    let services = services();
    let owner = registered(&services, "candace").await;
    let created = poll_with_options(&services, &owner, &["Red"]).await;

    let err = poll::remove_option(&services, &owner, &created.id.to_string(), value("red"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn only_the_owner_can_change_a_poll() {
    let services = services();
    let owner = registered(&services, "candace").await;
    let other = registered(&services, "doofenshmirtz").await;
    let created = poll_with_options(&services, &owner, &["Red"]).await;
    let id = created.id.to_string();

    let err = poll::add_option(&services, &other, &id, value("Evil")).await.unwrap_err();
    assert_not_change(err, OTHER_USER_POLL);

    // the payload is never looked at
    let err = poll::remove_option(&services, &other, &id, value("not an id")).await.unwrap_err();
    assert_not_change(err, OTHER_USER_POLL);

    let err = poll::publish(&services, &other, &id).await.unwrap_err();
    assert_not_change(err, OTHER_USER_POLL);

    let read = poll::get_poll(&services, &id).await.unwrap();
    assert_eq!(read.options.len(), 1);
    assert!(!read.published);
}

#[tokio::test]
async fn published_poll_is_locked() {
    let services = services();
    let owner = registered(&services, "candace").await;
    let created = poll_with_options(&services, &owner, &["Red"]).await;
    let id = created.id.to_string();
    let red = created.options[0].id.to_string();

    let published = poll::publish(&services, &owner, &id).await.unwrap();
    assert!(published.published);

    let err = poll::add_option(&services, &owner, &id, value("Blue")).await.unwrap_err();
    assert_not_change(err, PUBLISHED_POLL);

    let err = poll::remove_option(&services, &owner, &id, value(red)).await.unwrap_err();
    assert_not_change(err, PUBLISHED_POLL);

    let err = poll::publish(&services, &owner, &id).await.unwrap_err();
    assert_not_change(err, PUBLISHED_POLL);

    assert_eq!(poll::get_poll(&services, &id).await.unwrap().options.len(), 1);
}

#[tokio::test]
async fn lock_is_checked_before_ownership() {
    let services = services();
    let owner = registered(&services, "candace").await;
    let other = registered(&services, "doofenshmirtz").await;
    let created = poll_with_options(&services, &owner, &[]).await;
    let id = created.id.to_string();

    poll::publish(&services, &owner, &id).await.unwrap();

    let err = poll::add_option(&services, &other, &id, value("Evil")).await.unwrap_err();
    assert_not_change(err, PUBLISHED_POLL);
}

#[tokio::test]
async fn malformed_poll_id_cannot_be_changed() {
    let services = services();
    let owner = registered(&services, "candace").await;

    let err = poll::publish(&services, &owner, "not-a-poll").await.unwrap_err();

    assert!(matches!(err, AppError::NotChangePoll(_)));
}

#[tokio::test]
async fn unknown_poll_keeps_the_store_error() {
    let services = services();
    let owner = registered(&services, "candace").await;

    let err = poll::add_option(&services, &owner, &Uuid::from_u128(404).to_string(), value("Blue"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(ref m) if m == "poll not found"));
}

#[tokio::test]
async fn polls_are_listed_by_creation() {
    let services = services();
    let candace = registered(&services, "candace").await;
    let phineas = registered(&services, "phineas").await;

    for (caller, name) in [(&candace, "first"), (&phineas, "second"), (&candace, "third")] {
        poll::start_create_poll(&services, caller, CreatePollData { name: name.into() })
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let all: Vec<_> = poll::get_polls(&services)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(all, vec!["first", "second", "third"]);

    let mine: Vec<_> = poll::get_polls_mine(&services, &candace)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(mine, vec!["first", "third"]);
}

#[tokio::test]
async fn option_content_is_unique_within_a_poll() {
    let services = services();
    let owner = registered(&services, "candace").await;
    let created = poll_with_options(&services, &owner, &["Red"]).await;
    let id = created.id.to_string();

    let err = poll::add_option(&services, &owner, &id, value("Red")).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if *m == duplicate_option("Red")));
    assert_eq!(poll::get_poll(&services, &id).await.unwrap().options.len(), 1);

    // another poll may reuse it
    let other = poll_with_options(&services, &owner, &[]).await;
    poll::add_option(&services, &owner, &other.id.to_string(), value("Red"))
        .await
        .unwrap();
}
