//! Authentication interceptors.
//!
//! A unary/stream interceptor pair that shares one token-validation path:
//! pull the bearer token from the call metadata, dismantle it through the
//! configured token manager, and attach the verified identity to the
//! request context. Methods on the skip list pass through untouched so
//! login-style endpoints stay reachable without a token.
//!
//! Rejection messages are deliberately generic: the peer learns that the
//! token was missing or invalid, never why the manager rejected it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use tonic::metadata::MetadataMap;
use tonic::{Request, Response, Status};
use tracing::Instrument;

use pharos_core::{RequestContext, TokenManager, TokenManagerRegistry, User};

use crate::error::GrpcError;
use crate::interceptor::{
    ArcStreamHandler, ArcUnaryHandler, BoxServerStream, StreamInfo, StreamInterceptor, UnaryInfo,
    UnaryInterceptor, WrappedStream,
};

/// Metadata key the bearer token travels under, inbound and outbound.
pub const TOKEN_METADATA_KEY: &str = "x-access-token";

/// Default chain priority: auth runs before ordinary interceptors.
const DEFAULT_PRIORITY: i32 = 100;

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

fn default_header() -> String {
    TOKEN_METADATA_KEY.to_string()
}

fn default_token_manager() -> String {
    "jwt".to_string()
}

/// Configuration of the auth interceptor pair.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Chain priority, higher runs earlier.
    #[serde(default = "default_priority")]
    pub priority: i32,

    /// Advertised token header name, surfaced in documentation and client
    /// guidance. Informational only: the wire contract is fixed to
    /// [`TOKEN_METADATA_KEY`] regardless of this value.
    #[serde(default = "default_header")]
    pub header: String,

    /// Full-method prefixes exempt from authentication.
    ///
    /// A call is skipped when its full method name starts with any entry,
    /// so `/pharos.auth.v1.Auth/` exempts the whole service and
    /// `/pharos.auth.v1.Auth/Login` exactly one method.
    #[serde(default)]
    pub skip_methods: Vec<String>,

    /// Name of the token manager to validate tokens with.
    #[serde(default = "default_token_manager")]
    pub token_manager: String,

    /// Per-manager configuration blobs, keyed by manager name.
    #[serde(default)]
    pub token_managers: HashMap<String, serde_json::Value>,
}

impl AuthConfig {
    /// Decodes the configuration from an opaque document.
    ///
    /// `null` yields all defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GrpcError::Config`] when the document cannot be decoded.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, GrpcError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone()).map_err(GrpcError::Config)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            priority: default_priority(),
            header: default_header(),
            skip_methods: Vec::new(),
            token_manager: default_token_manager(),
            token_managers: HashMap::new(),
        }
    }
}

/// The shared validation path of the unary and stream interceptors.
struct Authenticator {
    skip_methods: Vec<String>,
    token_manager: Arc<dyn TokenManager>,
}

impl Authenticator {
    fn from_config(
        conf: &AuthConfig,
        managers: &TokenManagerRegistry,
    ) -> Result<Self, GrpcError> {
        let ctor = managers.lookup(&conf.token_manager)?;
        let manager_conf = conf
            .token_managers
            .get(&conf.token_manager)
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        let token_manager = ctor(&manager_conf)?;

        Ok(Self {
            skip_methods: conf.skip_methods.clone(),
            token_manager,
        })
    }

    /// Whether `full_method` is exempt from authentication.
    fn skip(&self, full_method: &str) -> bool {
        self.skip_methods
            .iter()
            .any(|prefix| full_method.starts_with(prefix.as_str()))
    }

    /// Extracts and validates the token, yielding the identity/token pair.
    ///
    /// The returned status carries only a generic message; manager errors
    /// go to the log.
    async fn authenticate(&self, metadata: &MetadataMap) -> Result<(User, String), Status> {
        let token = metadata
            .get(TOKEN_METADATA_KEY)
            .and_then(|v| v.to_str().ok())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Status::unauthenticated("core access token not found"))?
            .to_string();

        match self.token_manager.dismantle_token(&token).await {
            Ok(user) => Ok((user, token)),
            Err(e) => {
                tracing::warn!(error = %e, "token validation failed");
                Err(Status::unauthenticated("core access token is invalid"))
            }
        }
    }
}

/// Unary half of the auth interceptor pair.
pub struct AuthUnaryInterceptor {
    auth: Arc<Authenticator>,
}

#[async_trait]
impl UnaryInterceptor for AuthUnaryInterceptor {
    async fn intercept(
        &self,
        mut ctx: RequestContext,
        mut req: Request<Bytes>,
        info: UnaryInfo,
        next: ArcUnaryHandler,
    ) -> Result<Response<Bytes>, Status> {
        let span = auth_span(&info.full_method);

        if self.auth.skip(&info.full_method) {
            span.record("auth_enabled", false);
            tracing::debug!(parent: &span, method = %info.full_method, "skipping auth");
            return next.call(ctx, req, info).instrument(span).await;
        }
        span.record("auth_enabled", true);

        let (user, token) = self
            .auth
            .authenticate(req.metadata())
            .instrument(span.clone())
            .await?;
        record_identity(&span, &user);
        tracing::debug!(parent: &span, method = %info.full_method, user = %user.log_id(), "call authenticated");

        ctx.authenticate(user, token.clone());
        attach_token(req.metadata_mut(), &token);
        next.call(ctx, req, info).instrument(span).await
    }
}

/// Stream half of the auth interceptor pair.
///
/// On success the stream is wrapped so downstream handlers observe the
/// authenticated context; message traffic is untouched.
pub struct AuthStreamInterceptor {
    auth: Arc<Authenticator>,
}

#[async_trait]
impl StreamInterceptor for AuthStreamInterceptor {
    async fn intercept(
        &self,
        stream: BoxServerStream,
        info: StreamInfo,
        next: ArcStreamHandler,
    ) -> Result<(), Status> {
        let span = auth_span(&info.full_method);

        if self.auth.skip(&info.full_method) {
            span.record("auth_enabled", false);
            tracing::debug!(parent: &span, method = %info.full_method, "skipping auth");
            return next.call(stream, info).instrument(span).await;
        }
        span.record("auth_enabled", true);

        let (user, token) = self
            .auth
            .authenticate(stream.metadata())
            .instrument(span.clone())
            .await?;
        record_identity(&span, &user);
        tracing::debug!(parent: &span, method = %info.full_method, user = %user.log_id(), "stream authenticated");

        let mut ctx = stream.context().clone();
        ctx.authenticate(user, token);
        next.call(Box::new(WrappedStream::new(stream, ctx)), info)
            .instrument(span)
            .await
    }
}

/// Opens the per-call auth span. Identity fields stay empty until the call
/// is authenticated.
fn auth_span(full_method: &str) -> tracing::Span {
    tracing::info_span!(
        "auth",
        method = %full_method,
        auth_enabled = tracing::field::Empty,
        idp = tracing::field::Empty,
        opaque_id = tracing::field::Empty,
        username = tracing::field::Empty,
    )
}

/// Records the verified identity on the auth span. Never token material.
fn record_identity(span: &tracing::Span, user: &User) {
    span.record("idp", user.id.idp.as_str());
    span.record("opaque_id", user.id.opaque_id.as_str());
    span.record("username", user.username.as_str());
}

/// Re-attaches the validated token so proxied outbound calls carry it.
fn attach_token(metadata: &mut MetadataMap, token: &str) {
    match token.parse() {
        Ok(value) => {
            metadata.insert(TOKEN_METADATA_KEY, value);
        }
        Err(e) => tracing::warn!(error = %e, "token not representable as metadata value"),
    }
}

/// Builds the unary auth interceptor, returning it with its chain priority.
///
/// # Errors
///
/// Fails when the configuration cannot be decoded or the configured token
/// manager is unknown or cannot be constructed.
pub fn new_unary(
    conf: &serde_json::Value,
    managers: &TokenManagerRegistry,
) -> Result<(Arc<dyn UnaryInterceptor>, i32), GrpcError> {
    let conf = AuthConfig::from_value(conf)?;
    let auth = Arc::new(Authenticator::from_config(&conf, managers)?);
    Ok((Arc::new(AuthUnaryInterceptor { auth }), conf.priority))
}

/// Builds the stream auth interceptor, returning it with its chain priority.
///
/// # Errors
///
/// Same conditions as [`new_unary`].
pub fn new_stream(
    conf: &serde_json::Value,
    managers: &TokenManagerRegistry,
) -> Result<(Arc<dyn StreamInterceptor>, i32), GrpcError> {
    let conf = AuthConfig::from_value(conf)?;
    let auth = Arc::new(Authenticator::from_config(&conf, managers)?);
    Ok((Arc::new(AuthStreamInterceptor { auth }), conf.priority))
}
