use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use service::{FormErrors, ServiceError};
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::error::AppResult;
use crate::flash::{FlashCategory, FlashMessage};
use crate::forms::{LoginFields, LoginForm, LoginQuery, RegisterFields, RegisterForm};
use crate::schemas::{AppState, FormData};
use crate::session::{self, MaybeUser};
use crate::views;

pub const REGISTERED_MESSAGE: &str = "Your account has been created! You are now able to log in";
pub const LOGIN_FAILED_MESSAGE: &str = "Login Unsuccessful. Please check email and password";

pub async fn register_form(MaybeUser(user): MaybeUser, jar: CookieJar) -> Response {
    if user.is_some() {
        return views::redirect(jar, "/");
    }
    let data = FormData::new(RegisterFields::default(), FormErrors::new());
    views::page(jar, "Register", data)
}

#[instrument(skip_all, fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    if user.is_some() {
        return Ok(views::redirect(jar, "/"));
    }

    let registration = form.registration();
    let mut errors = FormErrors::from(form.validate());
    if !errors.is_empty() {
        // report taken names alongside the form's own problems
        errors.merge(state.identity.check_registration(&registration).await?);
        debug!("Registration rejected: {}", errors);
        return Ok(register_page(jar, form.fields(), errors));
    }

    match state.identity.register(registration).await {
        Ok(created) => {
            info!("Account {} created", created.id);
            Ok(views::redirect_with_flash(
                jar,
                "/login",
                FlashCategory::Success,
                REGISTERED_MESSAGE,
            ))
        }
        Err(ServiceError::Validation(errors)) => {
            debug!("Registration rejected: {}", errors);
            Ok(register_page(jar, form.fields(), errors))
        }
        Err(err) => Err(err.into()),
    }
}

fn register_page(jar: CookieJar, fields: RegisterFields, errors: FormErrors) -> Response {
    views::render(
        jar,
        StatusCode::UNPROCESSABLE_ENTITY,
        "Register",
        FormData::new(fields, errors),
        Vec::new(),
    )
}

pub async fn login_form(MaybeUser(user): MaybeUser, jar: CookieJar) -> Response {
    if user.is_some() {
        return views::redirect(jar, "/");
    }
    let data = FormData::new(LoginFields::default(), FormErrors::new());
    views::page(jar, "Login", data)
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if user.is_some() {
        return Ok(views::redirect(jar, "/"));
    }

    let errors = FormErrors::from(form.validate());
    if !errors.is_empty() {
        return Ok(views::render(
            jar,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Login",
            FormData::new(form.fields(), errors),
            Vec::new(),
        ));
    }

    match state.identity.authenticate(&form.email, &form.password).await {
        Ok(user) => {
            let grant = state.identity.start_session(&user, form.remember())?;
            let jar = session::start(jar, grant);
            let target = session::local_redirect_target(query.next.as_deref());
            info!("User {} logged in, continuing to {}", user.id, target);
            Ok(views::redirect(jar, target))
        }
        Err(ServiceError::AuthenticationFailed) => Ok(views::render(
            jar,
            StatusCode::UNAUTHORIZED,
            "Login",
            FormData::new(form.fields(), FormErrors::new()),
            vec![FlashMessage::new(FlashCategory::Danger, LOGIN_FAILED_MESSAGE)],
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn logout(jar: CookieJar) -> Response {
    views::redirect(session::end(jar), "/")
}
