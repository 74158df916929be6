//! Validating builder for [`ProviderDescriptor`].

// std
use std::net::IpAddr;
// crates.io
use url::Host;
// self
use crate::{_prelude::*, auth::ScopeSet, provider::ProviderDescriptor};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// Authorization endpoint was never set.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint was never set.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Redirect URI was never set.
	#[error("Missing redirect URI.")]
	MissingRedirectUri,
	/// Client identifier is empty.
	#[error("Client identifier must not be empty.")]
	MissingClientId,
	/// No scope was requested.
	#[error("Descriptor must request at least one scope.")]
	EmptyScope,
	/// Endpoint uses plaintext HTTP on a non-loopback host.
	#[error("The {endpoint} URL must use HTTPS or a loopback host: {url}.")]
	InsecureEndpoint {
		/// Which URL failed validation.
		endpoint: &'static str,
		/// URL that failed validation.
		url: String,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug, Default)]
pub struct ProviderDescriptorBuilder {
	authorization_endpoint: Option<Url>,
	token_endpoint: Option<Url>,
	client_id: String,
	redirect_uri: Option<Url>,
	scope: ScopeSet,
}
impl ProviderDescriptorBuilder {
	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the public client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = client_id.into();

		self
	}

	/// Sets the registered redirect URI.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Replaces the requested scopes.
	pub fn scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let authorization_endpoint = self
			.authorization_endpoint
			.ok_or(ProviderDescriptorError::MissingAuthorizationEndpoint)?;
		let token_endpoint =
			self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let redirect_uri = self.redirect_uri.ok_or(ProviderDescriptorError::MissingRedirectUri)?;

		if self.client_id.trim().is_empty() {
			return Err(ProviderDescriptorError::MissingClientId);
		}
		if self.scope.is_empty() {
			return Err(ProviderDescriptorError::EmptyScope);
		}

		validate_endpoint("authorization", &authorization_endpoint)?;
		validate_endpoint("token", &token_endpoint)?;
		validate_endpoint("redirect", &redirect_uri)?;

		Ok(ProviderDescriptor {
			authorization_endpoint,
			token_endpoint,
			client_id: self.client_id,
			redirect_uri,
			scope: self.scope,
		})
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}
