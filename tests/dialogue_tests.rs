use anyhow::Result;
use rust_decimal::Decimal;

use storefront::catalog::{Media, MediaKind, NewProduct};
use storefront::dialogue::{
    validate_field, CreationSession, Draft, Rejection, SessionInput, Step, Transition,
};

fn text(input: &str) -> SessionInput {
    SessionInput::Text(input.to_string())
}

/// Drive a session through a list of inputs, expecting every step to advance
fn walk(mut session: CreationSession, inputs: &[&str]) -> CreationSession {
    for input in inputs {
        session = match session.advance(text(input)) {
            Transition::Next(next) => next,
            other => panic!("Expected next step for {input:?}, got {other:?}"),
        };
    }
    session
}

/// Integration test for field validation shared by names and descriptions
#[tokio::test]
async fn test_field_validation() -> Result<()> {
    assert_eq!(validate_field("  Cola  "), Ok("Cola".to_string()));
    assert_eq!(validate_field(&"é".repeat(255)), Ok("é".repeat(255)));

    assert_eq!(validate_field(""), Err(Rejection::Empty));
    assert_eq!(validate_field("   "), Err(Rejection::Empty));
    assert_eq!(validate_field(&"a".repeat(256)), Err(Rejection::TooLong));

    Ok(())
}

/// Full product creation through every step
#[tokio::test]
async fn test_product_creation_walk() -> Result<()> {
    let start = CreationSession::AwaitingProductName {
        category_id: "cat_1".to_string(),
    };
    assert_eq!(start.step(), Some(Step::ProductName));

    let media_step = walk(start, &["Cola", "Fizzy drink", "99,99"]);
    assert_eq!(media_step.step(), Some(Step::ProductMedia));

    let photo = Media {
        id: "AgADphoto".to_string(),
        kind: MediaKind::Photo,
    };
    let Transition::Complete(Draft::Product(fields)) =
        media_step.advance(SessionInput::Media(photo.clone()))
    else {
        panic!("Product should be complete after media");
    };

    assert_eq!(
        fields,
        NewProduct {
            category_id: "cat_1".to_string(),
            name: "Cola".to_string(),
            description: "Fizzy drink".to_string(),
            price: "99.99".parse::<Decimal>()?,
            media: Some(photo),
        }
    );
    Ok(())
}

/// Skip keyword is case-insensitive and only meaningful at the media step
#[tokio::test]
async fn test_skip_keyword() -> Result<()> {
    let start = CreationSession::AwaitingProductName {
        category_id: "cat_1".to_string(),
    };
    let media_step = walk(start, &["Water", "Still", "1"]);

    match media_step.clone().advance(text(" SKIP ")) {
        Transition::Complete(Draft::Product(fields)) => assert!(fields.media.is_none()),
        other => panic!("Unexpected transition: {other:?}"),
    }

    // Any other text is refused without losing the collected fields
    match media_step.clone().advance(text("later")) {
        Transition::Retry(same, Rejection::ExpectedMedia) => assert_eq!(same, media_step),
        other => panic!("Unexpected transition: {other:?}"),
    }

    // "skip" as a product name is just a name
    let name_step = CreationSession::AwaitingProductName {
        category_id: "cat_1".to_string(),
    };
    assert!(matches!(
        name_step.advance(text("skip")),
        Transition::Next(CreationSession::AwaitingProductDescription { name, .. }) if name == "skip"
    ));
    Ok(())
}

/// Media cannot short-circuit the text steps
#[tokio::test]
async fn test_media_before_media_step_is_refused() -> Result<()> {
    let video = SessionInput::Media(Media {
        id: "BAADvideo".to_string(),
        kind: MediaKind::Video,
    });
    let sessions = [
        CreationSession::AwaitingCategoryName,
        CreationSession::AwaitingProductName {
            category_id: "cat_1".to_string(),
        },
        walk(
            CreationSession::AwaitingProductName {
                category_id: "cat_1".to_string(),
            },
            &["Cola", "Fizzy"],
        ),
    ];

    for session in sessions {
        match session.clone().advance(video.clone()) {
            Transition::Retry(same, Rejection::ExpectedText) => assert_eq!(same, session),
            other => panic!("Unexpected transition: {other:?}"),
        }
    }
    Ok(())
}

/// Invalid prices keep the session on the price step
#[tokio::test]
async fn test_invalid_prices() -> Result<()> {
    let price_step = walk(
        CreationSession::AwaitingProductName {
            category_id: "cat_1".to_string(),
        },
        &["Cola", "Fizzy"],
    );

    for input in ["abc", "", "-1", "1.2.3", "2.999", "10000000000000000000000000000"] {
        match price_step.clone().advance(text(input)) {
            Transition::Retry(same, Rejection::InvalidPrice) => assert_eq!(same, price_step),
            other => panic!("Unexpected transition for {input:?}: {other:?}"),
        }
    }
    Ok(())
}

/// Idle sessions swallow everything
#[tokio::test]
async fn test_idle_session_ignores_input() -> Result<()> {
    assert!(!CreationSession::Idle.is_active());
    assert_eq!(CreationSession::Idle.step(), None);
    assert_eq!(CreationSession::Idle.advance(text("12.50")), Transition::Ignored);
    assert_eq!(CreationSession::default(), CreationSession::Idle);
    Ok(())
}
