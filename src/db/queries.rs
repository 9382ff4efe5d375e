pub const SELECT_ELIGIBLE_ALERTS: &str = r#"
SELECT id, user_id, from_station_id, to_station_id, date, cabin_class,
       departure_start, departure_end, high_speed_only,
       is_active, status, status_reason, last_checked, deleted_at
FROM search_alerts
WHERE is_active = true
  AND status = 'PENDING'
  AND deleted_at IS NULL
  AND departure_start IS NOT NULL
  AND departure_end IS NOT NULL
ORDER BY created_at ASC;
"#;

pub const SELECT_ALERT_BY_ID: &str = r#"
SELECT id, user_id, from_station_id, to_station_id, date, cabin_class,
       departure_start, departure_end, high_speed_only,
       is_active, status, status_reason, last_checked, deleted_at
FROM search_alerts
WHERE id = $1;
"#;

// Only touches alerts that are still pending and not soft-deleted, so a
// concurrent delete or decline is never overwritten.
pub const UPDATE_PENDING_ALERT: &str = r#"
UPDATE search_alerts
SET is_active = COALESCE($2, is_active),
    status = COALESCE($3, status),
    status_reason = COALESCE($4, status_reason),
    last_checked = COALESCE($5, last_checked),
    updated_at = NOW()
WHERE id = $1
  AND status = 'PENDING'
  AND deleted_at IS NULL;
"#;
