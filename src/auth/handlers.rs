use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::session;
use crate::db::users::{self, NewUser};
use crate::error::AppResult;
use crate::extractors::{extract_session_token, CurrentUser, MaybeUser};
use crate::filters;
use crate::forms::{FormErrors, LoginForm, SignupForm};
use crate::routes::core::{Html, Layout};
use crate::state::AppState;

pub const BAD_CREDENTIALS: &str = "Please enter a correct username and password.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Signup fields in display order, with their labels.
const SIGNUP_FIELDS: [(&str, &str); 6] = [
    ("first_name", "First name"),
    ("last_name", "Last name"),
    ("username", "Username"),
    ("email", "Email address"),
    ("password1", "Password"),
    ("password2", "Password confirmation"),
];

// -- Templates --

#[derive(Template)]
#[template(path = "users/signup.html")]
pub struct SignupTemplate {
    pub layout: Layout,
    pub form: SignupForm,
    pub errors: FormErrors,
    pub fields: Vec<(&'static str, &'static str)>,
}

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub form: LoginForm,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "users/logged_out.html")]
pub struct LoggedOutTemplate {
    pub layout: Layout,
}

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Only same-site absolute paths are followed after login. Browsers drop
/// tabs and newlines while parsing a `Location`, so any whitespace or
/// control character rejects the target outright.
pub fn safe_next(next: &str) -> &str {
    let clean = !next
        .chars()
        .any(|c| c.is_ascii_control() || c.is_whitespace() || c == '\\');
    if clean && next.starts_with('/') && !next.starts_with("//") {
        next
    } else {
        "/"
    }
}

fn signed_in(state: &AppState, token: &str, to: &str) -> Response {
    let cookie = session::session_cookie(
        &state.config.auth.cookie_name,
        token,
        state.config.auth.session_hours,
    );
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, to.to_string()),
            (header::SET_COOKIE, cookie),
        ],
    )
        .into_response()
}

fn signup_page(
    user: Option<&CurrentUser>,
    form: SignupForm,
    errors: FormErrors,
) -> Html<SignupTemplate> {
    Html(SignupTemplate {
        layout: Layout::new(user),
        form,
        errors,
        fields: SIGNUP_FIELDS.to_vec(),
    })
}

// -- Signup --

/// GET /auth/signup/
pub async fn signup_form(MaybeUser(user): MaybeUser) -> Html<SignupTemplate> {
    signup_page(user.as_ref(), SignupForm::default(), FormErrors::default())
}

/// POST /auth/signup/: create the account and sign it in
pub async fn signup(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let mut errors = match form.validate() {
        Ok(()) => FormErrors::default(),
        Err(errors) => errors,
    };

    let conn = state.db.get()?;
    let username = form.username.trim();
    if errors.field("username").is_empty() && users::username_taken(&conn, username)? {
        errors.add("username", USERNAME_TAKEN);
    }
    if !errors.is_empty() {
        return Ok(signup_page(user.as_ref(), form, errors).into_response());
    }

    let hash = bcrypt::hash(&form.password1, state.config.auth.bcrypt_cost)?;
    let user_id = users::create(
        &conn,
        &NewUser {
            username,
            first_name: form.first_name.trim(),
            last_name: form.last_name.trim(),
            email: form.email.trim(),
            password_hash: Some(&hash),
        },
    )?;
    tracing::info!("Registered user {} ({})", username, user_id);

    let token = session::create_session(&conn, user_id, state.config.auth.session_hours)?;
    Ok(signed_in(&state, &token, "/"))
}

// -- Login --

/// GET /auth/login/?next=
pub async fn login_form(
    MaybeUser(user): MaybeUser,
    Query(query): Query<NextQuery>,
) -> Html<LoginTemplate> {
    Html(LoginTemplate {
        layout: Layout::new(user.as_ref()),
        form: LoginForm {
            next: query.next.unwrap_or_default(),
            ..Default::default()
        },
        errors: FormErrors::default(),
    })
}

/// POST /auth/login/: check the password and start a session
pub async fn login(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let rejected = |form: LoginForm, errors: FormErrors| {
        Html(LoginTemplate {
            layout: Layout::new(user.as_ref()),
            form,
            errors,
        })
        .into_response()
    };

    if let Err(errors) = form.validate() {
        return Ok(rejected(form, errors));
    }

    let conn = state.db.get()?;
    let account = users::find_by_username(&conn, form.username.trim())?;
    let verified = match account.as_ref().and_then(|a| a.password_hash.as_deref()) {
        Some(hash) => bcrypt::verify(&form.password, hash)?,
        None => false,
    };

    let account = match account {
        Some(account) if verified => account,
        _ => {
            tracing::warn!("Failed login for {:?}", form.username.trim());
            let mut errors = FormErrors::default();
            errors.add_non_field(BAD_CREDENTIALS);
            return Ok(rejected(form, errors));
        }
    };

    let token = session::create_session(&conn, account.id, state.config.auth.session_hours)?;
    tracing::info!("User {} logged in", account.username);
    Ok(signed_in(&state, &token, safe_next(&form.next)))
}

// -- Logout --

/// GET|POST /auth/logout/: end the session and show the goodbye page
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;
    if let Some(token) = extract_session_token(&headers, cookie_name) {
        let conn = state.db.get()?;
        session::delete_session(&conn, token)?;
    }

    let page = Html(LoggedOutTemplate {
        layout: Layout::anonymous(),
    });
    Ok((
        [(header::SET_COOKIE, session::clear_session_cookie(cookie_name))],
        page,
    )
        .into_response())
}
