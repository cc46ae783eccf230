use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Method, Request, Response, StatusCode};
use tracing::{info, warn};

use crate::auth::gate::{BearerGate, RoleChecker};
use crate::handlers::http::utils::json_response;
use crate::handlers::http::{auth, books, reviews, tags};
use crate::AppState;

use shared::types::jwt::TokenClaims;

/// Roles allowed on the standard catalogue endpoints.
pub const STANDARD_ROLES: &[&str] = &["admin", "user"];

// ---------------------------------------------------------------------------
// Handler type aliases
// ---------------------------------------------------------------------------
//
// Four security tiers:
//
//   OpenHandler    — no auth.  Receives (req, state).
//                    Use for: /signup, /login, /health.
//
//   AuthedHandler  — the router has already run a bearer gate and, for
//                    Protected routes, the role checker.  Receives
//                    (req, state, claims) and MUST NOT re-validate.

type OpenHandler = Box<
    dyn Fn(
            Request<hyper::body::Incoming>,
            AppState,
        )
            -> Pin<Box<dyn Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send>>
        + Send
        + Sync,
>;

type AuthedHandler = Box<
    dyn Fn(
            Request<hyper::body::Incoming>,
            AppState,
            TokenClaims, // validated by the router before the handler runs
        )
            -> Pin<Box<dyn Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send>>
        + Send
        + Sync,
>;

// ---------------------------------------------------------------------------
// RouteKind
// ---------------------------------------------------------------------------

enum RouteKind {
    /// No authentication check.
    Open(OpenHandler),

    /// Access-token gate only: signature + expiry + revocation + kind.
    /// No role requirement — logout lives here.
    Access(AuthedHandler),

    /// Access-token gate plus a role allow-list fixed at router build time.
    Protected(AuthedHandler, RoleChecker),

    /// Refresh-token gate: only the token-refresh endpoint.
    Refresh(AuthedHandler),
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

struct Route {
    method: Method,
    path: String,
    kind: RouteKind,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub struct Router {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_count", &self.routes.len())
            .finish()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    // ── Open (no auth) ────────────────────────────────────────────────────────

    /// GET with no authentication — use for health checks only.
    pub fn get<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::GET,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    /// POST with no authentication — use only for signup / login.
    pub fn post<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::POST,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    // ── Access gate, no role requirement ─────────────────────────────────────

    /// GET guarded by the access-token gate only.
    pub fn get_access<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, TokenClaims) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::GET,
            path: path.to_string(),
            kind: RouteKind::Access(Box::new(move |req, state, claims| {
                Box::pin(handler(req, state, claims))
            })),
        });
        self
    }

    // ── Refresh gate ─────────────────────────────────────────────────────────

    /// GET guarded by the refresh-token gate — the refresh endpoint only.
    pub fn get_refresh<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, TokenClaims) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::GET,
            path: path.to_string(),
            kind: RouteKind::Refresh(Box::new(move |req, state, claims| {
                Box::pin(handler(req, state, claims))
            })),
        });
        self
    }

    // ── Protected (access gate + role allow-list) ────────────────────────────
    //
    // Auth is enforced here at the routing level — handlers receive the
    // validated claims and must NOT call the gate themselves.

    fn protected<F, Fut>(
        mut self,
        method: Method,
        path: &str,
        roles: &'static [&'static str],
        handler: F,
    ) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, TokenClaims) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            kind: RouteKind::Protected(
                Box::new(move |req, state, claims| Box::pin(handler(req, state, claims))),
                RoleChecker::new(roles),
            ),
        });
        self
    }

    /// GET guarded by **protected** auth (access gate + roles).
    pub fn get_protected<F, Fut>(
        self,
        path: &str,
        roles: &'static [&'static str],
        handler: F,
    ) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, TokenClaims) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.protected(Method::GET, path, roles, handler)
    }

    /// POST guarded by **protected** auth.
    pub fn post_protected<F, Fut>(
        self,
        path: &str,
        roles: &'static [&'static str],
        handler: F,
    ) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, TokenClaims) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.protected(Method::POST, path, roles, handler)
    }

    /// PUT guarded by **protected** auth.
    pub fn put_protected<F, Fut>(
        self,
        path: &str,
        roles: &'static [&'static str],
        handler: F,
    ) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, TokenClaims) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.protected(Method::PUT, path, roles, handler)
    }

    /// PATCH guarded by **protected** auth.
    pub fn patch_protected<F, Fut>(
        self,
        path: &str,
        roles: &'static [&'static str],
        handler: F,
    ) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, TokenClaims) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.protected(Method::PATCH, path, roles, handler)
    }

    /// DELETE guarded by **protected** auth.
    pub fn delete_protected<F, Fut>(
        self,
        path: &str,
        roles: &'static [&'static str],
        handler: F,
    ) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, TokenClaims) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.protected(Method::DELETE, path, roles, handler)
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    pub async fn route(
        &self,
        req: Request<hyper::body::Incoming>,
        state: AppState,
    ) -> Result<Response<BoxBody<Bytes, Infallible>>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let started = std::time::Instant::now();

        let response = self.dispatch(req, state).await;
        if let Ok(resp) = &response {
            info!(
                "{} {} -> {} in {:?}",
                method,
                path,
                resp.status().as_u16(),
                started.elapsed()
            );
        }
        response
    }

    async fn dispatch(
        &self,
        req: Request<hyper::body::Incoming>,
        state: AppState,
    ) -> Result<Response<BoxBody<Bytes, Infallible>>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        for route in &self.routes {
            if route.method != method || !Self::path_matches(&route.path, &path) {
                continue;
            }

            return match &route.kind {
                // ── Open ──────────────────────────────────────────────────────
                RouteKind::Open(h) => h(req, state).await,

                // ── Access gate only ─────────────────────────────────────────
                RouteKind::Access(h) => {
                    let gate = BearerGate::access();
                    match gate
                        .validate(req.headers(), &state.issuer, state.blocklist.as_ref())
                        .await
                    {
                        Ok(claims) => h(req, state, claims).await,
                        Err(err) => {
                            warn!("Access gate rejected {} {}: {}", method, path, err);
                            json_response::deliver_auth_error(&err)
                        }
                    }
                }

                // ── Access gate + role allow-list ────────────────────────────
                RouteKind::Protected(h, checker) => {
                    let gate = BearerGate::access();
                    match gate
                        .validate(req.headers(), &state.issuer, state.blocklist.as_ref())
                        .await
                        .and_then(|claims| checker.check(&claims).map(|()| claims))
                    {
                        Ok(claims) => h(req, state, claims).await,
                        Err(err) => {
                            warn!("Protected gate rejected {} {}: {}", method, path, err);
                            json_response::deliver_auth_error(&err)
                        }
                    }
                }

                // ── Refresh gate ─────────────────────────────────────────────
                RouteKind::Refresh(h) => {
                    let gate = BearerGate::refresh();
                    match gate
                        .validate(req.headers(), &state.issuer, state.blocklist.as_ref())
                        .await
                    {
                        Ok(claims) => h(req, state, claims).await,
                        Err(err) => {
                            warn!("Refresh gate rejected {} {}: {}", method, path, err);
                            json_response::deliver_auth_error(&err)
                        }
                    }
                }
            };
        }

        json_response::deliver_error_json("NOT_FOUND", "Endpoint not found", StatusCode::NOT_FOUND)
            .context("Failed to deliver 404 response")
    }

    // ── Path matching ─────────────────────────────────────────────────────────

    pub fn path_matches(route_path: &str, request_path: &str) -> bool {
        // Strip query string from incoming request path before comparing.
        let clean = request_path.split('?').next().unwrap_or(request_path);

        // Exact match.
        if route_path == clean {
            return true;
        }

        // Segment-by-segment matching for `:param` wildcards.
        // e.g.  "/api/v1/books/:book_id"  matches  "/api/v1/books/abc-123"
        let route_segs: Vec<&str> = route_path.split('/').collect();
        let path_segs: Vec<&str> = clean.split('/').collect();

        if route_segs.len() != path_segs.len() {
            return false;
        }

        route_segs
            .iter()
            .zip(path_segs.iter())
            .all(|(r, p)| r.starts_with(':') || r == p)
    }
}

// ---------------------------------------------------------------------------
// API router
//
// Auth tier is enforced here at the routing level — handlers MUST NOT repeat
// the gate call.  The contract is:
//
//   .get(...) / .post(...)   → Open       — handler gets (req, state)
//   .get_access(...)         → Access     — handler gets (req, state, claims)
//   .get_refresh(...)        → Refresh    — same, refresh claims
//   .*_protected(...)        → Protected  — same, role already checked
// ---------------------------------------------------------------------------

pub fn build_api_router() -> Router {
    Router::new()
        // ── Public: no auth ──────────────────────────────────────────────────
        .get("/health", |_req, _state| async move {
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("content-type", "application/json")
                .body(json_response::full(r#"{"status":"success","health":"ok"}"#))
                .context("Failed to build health response")?)
        })
        .post("/api/v1/auth/signup", |req, state| async move {
            auth::signup::handle_signup(req, state)
                .await
                .context("Signup failed")
        })
        .post("/api/v1/auth/login", |req, state| async move {
            auth::login::handle_login(req, state)
                .await
                .context("Login failed")
        })
        // ── Token lifecycle ──────────────────────────────────────────────────
        //
        // Refresh presents the long-lived token; logout needs only a valid
        // access token (no role), since revocation is not a role-gated act.
        .get_refresh("/api/v1/auth/refresh", |req, state, claims| async move {
            auth::refresh::handle_refresh(req, state, claims)
                .await
                .context("Token refresh failed")
        })
        .get_access("/api/v1/auth/logout", |req, state, claims| async move {
            auth::logout::handle_logout(req, state, claims)
                .await
                .context("Logout failed")
        })
        .get_protected("/api/v1/auth/me", STANDARD_ROLES, |req, state, claims| async move {
            auth::me::handle_me(req, state, claims)
                .await
                .context("Current-user lookup failed")
        })
        // ── Books ────────────────────────────────────────────────────────────
        .get_protected("/api/v1/books", STANDARD_ROLES, |req, state, claims| async move {
            books::handle_list_books(req, state, claims)
                .await
                .context("Book list failed")
        })
        .post_protected("/api/v1/books", STANDARD_ROLES, |req, state, claims| async move {
            books::handle_create_book(req, state, claims)
                .await
                .context("Book create failed")
        })
        .get_protected(
            "/api/v1/books/user/:user_id",
            STANDARD_ROLES,
            |req, state, claims| async move {
                books::handle_list_user_books(req, state, claims)
                    .await
                    .context("User book list failed")
            },
        )
        .get_protected(
            "/api/v1/books/:book_id",
            STANDARD_ROLES,
            |req, state, claims| async move {
                books::handle_get_book(req, state, claims)
                    .await
                    .context("Book get failed")
            },
        )
        .patch_protected(
            "/api/v1/books/:book_id",
            STANDARD_ROLES,
            |req, state, claims| async move {
                books::handle_update_book(req, state, claims)
                    .await
                    .context("Book update failed")
            },
        )
        .delete_protected(
            "/api/v1/books/:book_id",
            STANDARD_ROLES,
            |req, state, claims| async move {
                books::handle_delete_book(req, state, claims)
                    .await
                    .context("Book delete failed")
            },
        )
        // ── Tags ─────────────────────────────────────────────────────────────
        .get_protected("/api/v1/tags", STANDARD_ROLES, |req, state, claims| async move {
            tags::handle_list_tags(req, state, claims)
                .await
                .context("Tag list failed")
        })
        .post_protected("/api/v1/tags", STANDARD_ROLES, |req, state, claims| async move {
            tags::handle_create_tag(req, state, claims)
                .await
                .context("Tag create failed")
        })
        .post_protected(
            "/api/v1/tags/book/:book_id",
            STANDARD_ROLES,
            |req, state, claims| async move {
                tags::handle_add_tags_to_book(req, state, claims)
                    .await
                    .context("Tag attach failed")
            },
        )
        .put_protected(
            "/api/v1/tags/:tag_id",
            STANDARD_ROLES,
            |req, state, claims| async move {
                tags::handle_update_tag(req, state, claims)
                    .await
                    .context("Tag update failed")
            },
        )
        .delete_protected(
            "/api/v1/tags/:tag_id",
            STANDARD_ROLES,
            |req, state, claims| async move {
                tags::handle_delete_tag(req, state, claims)
                    .await
                    .context("Tag delete failed")
            },
        )
        // ── Reviews ──────────────────────────────────────────────────────────
        .get_protected(
            "/api/v1/reviews/book/:book_id",
            STANDARD_ROLES,
            |req, state, claims| async move {
                reviews::handle_list_reviews(req, state, claims)
                    .await
                    .context("Review list failed")
            },
        )
        .post_protected(
            "/api/v1/reviews/book/:book_id",
            STANDARD_ROLES,
            |req, state, claims| async move {
                reviews::handle_add_review(req, state, claims)
                    .await
                    .context("Review create failed")
            },
        )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
