//! Schema extensions
//!
//! Arguments that don't fit the schema (an `orderBy` element naming a field
//! other than `description`, `url` or `createdAt`, a direction other than
//! `asc`/`desc`, a string where an `Int` is expected) are rejected during
//! validation, before any resolver runs. [`ArgumentErrorCodes`] gives those
//! errors the same `INVALID_ARGUMENT` code resolvers use.

use std::sync::Arc;

use async_graphql::extensions::{Extension, ExtensionContext, ExtensionFactory, NextValidation};
use async_graphql::{ServerError, ValidationResult};

/// Tag validation errors with `extensions.code = "INVALID_ARGUMENT"`
pub struct ArgumentErrorCodes;

impl ExtensionFactory for ArgumentErrorCodes {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(ArgumentErrorCodesExtension)
    }
}

struct ArgumentErrorCodesExtension;

#[async_trait::async_trait]
impl Extension for ArgumentErrorCodesExtension {
    async fn validation(
        &self,
        ctx: &ExtensionContext<'_>,
        next: NextValidation<'_>,
    ) -> Result<ValidationResult, Vec<ServerError>> {
        next.run(ctx).await.map_err(|errors| {
            errors
                .into_iter()
                .map(|mut err| {
                    tracing::debug!(error = %err.message, "request rejected during validation");
                    err.extensions
                        .get_or_insert_with(Default::default)
                        .set("code", "INVALID_ARGUMENT");
                    err
                })
                .collect()
        })
    }
}
