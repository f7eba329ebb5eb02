//! HTTP client for the management API.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rolecheck_auth::TokenCredential;
use rolecheck_core::{AssignmentKind, AssignmentRecord, ScopeIdentifier, ScopeSnapshot};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::types::{Page, PolicyAssignment, RoleAssignment, Subscription};
use crate::{ArmConfig, ArmError, ArmResult, AssignmentSource};

/// Upper bound on pages followed for one listing.
const MAX_PAGES: usize = 1_000;

/// Management API client.
#[derive(Clone)]
pub struct ArmClient {
    config: ArmConfig,
    endpoint: Url,
    credential: Arc<dyn TokenCredential>,
    http: reqwest::Client,
}

impl std::fmt::Debug for ArmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("credential", &self.credential.source())
            .finish_non_exhaustive()
    }
}

impl ArmClient {
    /// Create a client.
    ///
    /// # Errors
    /// Returns `ArmError::Config` if the configuration is invalid, or
    /// `ArmError::Http` if the HTTP client cannot be built.
    pub fn new(config: ArmConfig, credential: Arc<dyn TokenCredential>) -> ArmResult<Self> {
        config.validate()?;
        let endpoint = config.endpoint_url()?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(u64::from(config.connect_timeout_ms)))
            .timeout(Duration::from_millis(u64::from(config.request_timeout_ms)))
            .user_agent(concat!("rolecheck/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config,
            endpoint,
            credential,
            http,
        })
    }

    /// URL listing assignments of `kind` visible at `scope`.
    #[must_use]
    pub fn assignments_url(&self, scope: &ScopeIdentifier, kind: AssignmentKind) -> Url {
        let (collection, api_version) = match kind {
            AssignmentKind::Role => ("roleAssignments", &self.config.role_api_version),
            AssignmentKind::Policy => ("policyAssignments", &self.config.policy_api_version),
        };
        let resource = format!(
            "{}/providers/Microsoft.Authorization/{collection}",
            scope.path()
        );
        let mut url = self.resource_url(&resource);
        url.set_query(Some(&format!(
            "api-version={api_version}&$filter=atScope()"
        )));
        url
    }

    /// URL listing the caller's subscriptions.
    #[must_use]
    pub fn subscriptions_url(&self) -> Url {
        let mut url = self.resource_url("/subscriptions");
        url.query_pairs_mut()
            .append_pair("api-version", &self.config.subscription_api_version);
        url
    }

    fn resource_url(&self, resource: &str) -> Url {
        let mut url = self.endpoint.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base}{resource}"));
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ArmResult<T> {
        let token = self.credential.get_token().await?;

        let response = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, token.authorization_header())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ArmError::from_response(status.as_u16(), &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch `first` and every page its `nextLink` chain points at.
    async fn list_pages<T: DeserializeOwned>(&self, first: Url) -> ArmResult<Vec<T>> {
        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(first);

        while let Some(url) = next.take() {
            if !seen.insert(url.to_string()) {
                return Err(ArmError::Pagination(format!(
                    "nextLink repeats an earlier page: {url}"
                )));
            }
            if seen.len() > MAX_PAGES {
                return Err(ArmError::Pagination(format!(
                    "more than {MAX_PAGES} pages"
                )));
            }

            let page: Page<T> = self.get_json(url).await?;
            items.extend(page.value);

            if let Some(link) = page.next_link.filter(|link| !link.is_empty()) {
                next = Some(self.next_page_url(&link)?);
            }
        }

        debug!(pages = seen.len(), items = items.len(), "Listing complete");
        Ok(items)
    }

    // The bearer token is only ever sent back to the configured endpoint.
    fn next_page_url(&self, link: &str) -> ArmResult<Url> {
        let url = self.endpoint.join(link)?;
        if url.origin() != self.endpoint.origin() {
            return Err(ArmError::Pagination(format!(
                "nextLink points outside {}: {url}",
                self.endpoint.origin().ascii_serialization()
            )));
        }
        Ok(url)
    }
}

fn collect_records<T>(
    items: Vec<T>,
    kind: AssignmentKind,
    convert: impl Fn(T) -> Option<AssignmentRecord>,
) -> ScopeSnapshot {
    let total = items.len();
    let snapshot: ScopeSnapshot = items.into_iter().filter_map(convert).collect();
    let skipped = total - snapshot.len();
    if skipped > 0 {
        warn!(%kind, skipped, "Skipped assignments without a definition id");
    }
    snapshot
}

#[async_trait]
impl AssignmentSource for ArmClient {
    #[instrument(skip_all, fields(scope = %scope, kind = %kind))]
    async fn list_assignments(
        &self,
        scope: &ScopeIdentifier,
        kind: AssignmentKind,
    ) -> ArmResult<ScopeSnapshot> {
        let url = self.assignments_url(scope, kind);
        let snapshot = match kind {
            AssignmentKind::Role => {
                let items: Vec<RoleAssignment> = self.list_pages(url).await?;
                collect_records(items, kind, RoleAssignment::into_record)
            }
            AssignmentKind::Policy => {
                let items: Vec<PolicyAssignment> = self.list_pages(url).await?;
                collect_records(items, kind, PolicyAssignment::into_record)
            }
        };
        debug!(
            records = snapshot.len(),
            distinct = snapshot.distinct_len(),
            "Fetched assignments"
        );
        Ok(snapshot)
    }

    #[instrument(skip(self))]
    async fn default_subscription(&self) -> ArmResult<String> {
        let subscriptions: Vec<Subscription> = self.list_pages(self.subscriptions_url()).await?;
        let total = subscriptions.len();
        let chosen = subscriptions
            .into_iter()
            .find(Subscription::is_enabled)
            .ok_or(ArmError::NoSubscription)?;
        debug!(
            subscription = %chosen.subscription_id,
            visible = total,
            "Resolved default subscription"
        );
        Ok(chosen.subscription_id)
    }
}
