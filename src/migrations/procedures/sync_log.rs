use async_trait::async_trait;
use log::debug;

use super::SYNC_LOG_TABLE;
use crate::core::{Result, Value};
use crate::migrations::bundle::MigrationBundle;
use crate::migrations::registry::MigrationProcedure;

/// Two sync-log fields were optional, which makes any index over them
/// sparse and full-table queries impossible. Fill them on every row:
/// a missing or null `sharedOn` becomes 0, and `needsIntegration` is
/// collapsed to a 0/1 flag by truthiness, whatever shape it held before.
pub struct FillEmptySyncLogFields;

#[async_trait]
impl MigrationProcedure for FillEmptySyncLogFields {
    fn id(&self) -> &'static str {
        "fill-out-empty-sync-log-fields"
    }

    fn description(&self) -> &'static str {
        "backfill optional sync-log fields so their indexes cover every row"
    }

    async fn run(&self, bundle: &MigrationBundle) -> Result<()> {
        let changed = bundle
            .db
            .modify_where(
                SYNC_LOG_TABLE,
                &|_| true,
                &|entry| {
                    if entry.get("sharedOn").is_none_or(Value::is_null) {
                        entry.set("sharedOn", 0i64);
                    }

                    let needs_integration =
                        entry.get("needsIntegration").is_some_and(Value::as_bool);
                    entry.set("needsIntegration", i64::from(needs_integration));
                    Ok(())
                },
            )
            .await?;

        debug!("sync log fields backfilled: entries={}", changed);
        Ok(())
    }
}
