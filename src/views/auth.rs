use askama::Template;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::auth::extractor::ACCESS_COOKIE;
use crate::auth::jwt;
use crate::error::AppError;
use crate::routes::auth::{authenticate, register_user};
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    identifier: String,
    notice: Option<String>,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "auth/signup.html")]
struct SignupTemplate {
    username: String,
    email: String,
    error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub registered: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

fn session_cookie(token: String, state: &SharedState) -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(state.config.token_ttl_minutes))
        .build()
}

pub async fn login_page(
    State(state): State<SharedState>,
    jar: CookieJar,
    Query(q): Query<LoginQuery>,
) -> Response {
    // If already logged in, go straight to the list
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        if jwt::decode_token(cookie.value(), &state.config.jwt_secret).is_ok() {
            return Redirect::to("/employees").into_response();
        }
    }

    let template = LoginTemplate {
        identifier: String::new(),
        notice: q
            .registered
            .map(|_| "Account created. You can log in now.".to_string()),
        error: None,
    };
    Html(template.render().unwrap_or_default()).into_response()
}

pub async fn login_submit(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let result = if form.identifier.trim().is_empty() {
        Err(AppError::validation("Please enter your username or email."))
    } else {
        authenticate(&state, &form.identifier, &form.password).await
    };

    match result {
        Ok((_, token)) => {
            let jar = jar.add(session_cookie(token, &state));
            (jar, Redirect::to("/employees")).into_response()
        }
        Err(err) => {
            let template = LoginTemplate {
                identifier: form.identifier,
                notice: None,
                error: Some(err.user_message()),
            };
            Html(template.render().unwrap_or_default()).into_response()
        }
    }
}

pub async fn signup_page() -> impl IntoResponse {
    let template = SignupTemplate {
        username: String::new(),
        email: String::new(),
        error: None,
    };
    Html(template.render().unwrap_or_default())
}

pub async fn signup_submit(
    State(state): State<SharedState>,
    Form(form): Form<SignupForm>,
) -> Response {
    match register_user(&state, &form.username, &form.email, &form.password).await {
        Ok(_) => Redirect::to("/login?registered=1").into_response(),
        Err(err) => {
            let template = SignupTemplate {
                username: form.username,
                email: form.email,
                error: Some(err.user_message()),
            };
            Html(template.render().unwrap_or_default()).into_response()
        }
    }
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(ACCESS_COOKIE).path("/"));
    (jar, Redirect::to("/login"))
}
