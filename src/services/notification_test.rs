use super::*;
use crate::frame::ErrorCode;
use crate::state::test_helpers;

fn row(kind: &str) -> NotificationRow {
    NotificationRow {
        id: Uuid::new_v4(),
        message: "Nueva venta registrada".into(),
        kind: kind.into(),
        is_read: false,
        created_at: OffsetDateTime::UNIX_EPOCH,
    }
}

#[test]
fn low_stock_message_names_product_and_quantity() {
    assert_eq!(
        low_stock_message("Resistencia 220Ω", 3),
        "El producto Resistencia 220Ω tiene pocas existencias (3 restantes)."
    );
}

#[test]
fn kind_round_trips_through_column_text() {
    for kind in [NotificationKind::System, NotificationKind::Stock] {
        assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(NotificationKind::parse("STOCK"), None);
}

#[test]
fn row_conversion_maps_kind() {
    assert_eq!(Notification::from(row("stock")).kind, NotificationKind::Stock);
    assert_eq!(Notification::from(row("legacy")).kind, NotificationKind::System);
}

#[test]
fn notification_serializes_lowercase_kind_and_rfc3339() {
    let json = serde_json::to_value(Notification::from(row("stock"))).unwrap();
    assert_eq!(json["kind"], "stock");
    assert_eq!(json["is_read"], false);
    assert_eq!(json["created_at"], "1970-01-01T00:00:00Z");
}

#[test]
fn error_codes() {
    assert_eq!(NotificationError::NotFound(Uuid::nil()).error_code(), "E_NOTIFICATION_NOT_FOUND");
    assert_eq!(NotificationError::EmptyMessage.error_code(), "E_INVALID_NOTIFICATION");
    assert!(!NotificationError::EmptyMessage.retryable());
}

#[tokio::test]
async fn create_rejects_blank_message_without_db() {
    let state = test_helpers::test_app_state();
    let err = create_notification(&state, "   ", NotificationKind::System).await.unwrap_err();
    assert!(matches!(err, NotificationError::EmptyMessage));
}

#[cfg(feature = "live-db-tests")]
mod live {
    use super::*;

    #[tokio::test]
    async fn create_publishes_and_mark_read_updates() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required for live-db-tests");
        let mut state = test_helpers::test_app_state();
        state.pool = crate::db::init_pool(&url).await.expect("init pool");
        let (_client, mut rx) = test_helpers::subscribe(&state).await;

        let created = create_notification(&state, "Inventario actualizado", NotificationKind::System)
            .await
            .unwrap();
        assert!(!created.is_read);
        assert_eq!(rx.recv().await.unwrap().syscall, feed::NOTIFICATION_CREATED);

        let read = mark_read(&state, created.id).await.unwrap();
        assert!(read.is_read);
        assert_eq!(rx.recv().await.unwrap().syscall, feed::NOTIFICATION_UPDATED);

        let listed = list_notifications(&state.pool).await.unwrap();
        assert!(listed.iter().any(|n| n.id == created.id));
    }
}
