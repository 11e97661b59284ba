//! Octocrab client construction for the GraphQL gateway.

use http::Uri;
use octocrab::Octocrab;
use url::Url;

use crate::github::error::FetchError;
use crate::github::locator::PersonalAccessToken;

/// Builds an Octocrab client authenticated with `token` against `api_base`.
///
/// # Errors
///
/// Returns [`FetchError::Malformed`] when the base URL is not a valid URI or
/// Octocrab refuses the configuration.
pub(super) fn build_octocrab_client(
    token: &PersonalAccessToken,
    api_base: &Url,
) -> Result<Octocrab, FetchError> {
    let base_uri: Uri = api_base
        .as_str()
        .parse::<Uri>()
        .map_err(|error| FetchError::malformed("build client", error.to_string()))?;

    Octocrab::builder()
        .personal_token(token.as_ref())
        .base_uri(base_uri)
        .map_err(|error| FetchError::malformed("build client", error.to_string()))?
        .build()
        .map_err(|error| FetchError::malformed("build client", error.to_string()))
}
