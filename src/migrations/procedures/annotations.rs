use async_trait::async_trait;
use log::debug;

use super::ANNOTATIONS_TABLE;
use crate::core::{Result, Value};
use crate::migrations::bundle::MigrationBundle;
use crate::migrations::registry::MigrationProcedure;

/// Annotations written by a buggy path are missing `pageUrl`, the field
/// every page lookup joins on. Re-derive it from the full `url`.
///
/// Only a truly absent field is backfilled. An explicit null was written
/// deliberately by something else and is left for that something to fix.
pub struct BackfillAnnotationPageUrls;

#[async_trait]
impl MigrationProcedure for BackfillAnnotationPageUrls {
    fn id(&self) -> &'static str {
        "annots-undefined-pageUrl-field"
    }

    fn description(&self) -> &'static str {
        "derive missing annotation pageUrl fields from their url"
    }

    async fn run(&self, bundle: &MigrationBundle) -> Result<()> {
        let changed = bundle
            .db
            .modify_where(
                ANNOTATIONS_TABLE,
                &|annotation| !annotation.has("pageUrl"),
                &|annotation| {
                    let page_url = bundle.normalize(annotation.require_str("url")?);
                    annotation.set("pageUrl", page_url);
                    Ok(())
                },
            )
            .await?;

        debug!("annotation pageUrl backfilled: rows={}", changed);
        Ok(())
    }
}

/// Annotations from before edit tracking carry no usable `lastEdited`:
/// the field is absent, null, or an empty object left by a serializer
/// fault. Seed all three from the creation time.
pub struct BackfillAnnotationLastEdited;

#[async_trait]
impl MigrationProcedure for BackfillAnnotationLastEdited {
    fn id(&self) -> &'static str {
        "annots-created-when-to-last-edited"
    }

    fn description(&self) -> &'static str {
        "seed empty annotation lastEdited fields from createdWhen"
    }

    async fn run(&self, bundle: &MigrationBundle) -> Result<()> {
        let changed = bundle
            .db
            .modify_where(
                ANNOTATIONS_TABLE,
                &|annotation| match annotation.get("lastEdited") {
                    None => true,
                    Some(Value::Null) => true,
                    // a plain empty object; an empty array is some other bug
                    Some(Value::Object(fields)) => fields.is_empty(),
                    Some(_) => false,
                },
                &|annotation| {
                    let created = annotation.require("createdWhen")?.clone();
                    annotation.set("lastEdited", created);
                    Ok(())
                },
            )
            .await?;

        debug!("annotation lastEdited backfilled: rows={}", changed);
        Ok(())
    }
}
