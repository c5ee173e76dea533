//! Typed HTTP client for the `/api/v1` surface.
//!
//! A [`Session`] returned by [`ApiClient::login`] is passed explicitly to every
//! authenticated call; the client itself holds no credentials.

use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::models::{EmployeeInput, EmployeePatch, EmployeeResponse};

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub username: String,
}

#[derive(Debug)]
pub enum ClientError {
    /// The server answered with an error body.
    Api {
        status: StatusCode,
        code: Option<ErrorCode>,
        message: String,
    },
    Transport(reqwest::Error),
}

impl ClientError {
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Api { code, .. } => *code,
            ClientError::Transport(_) => None,
        }
    }

    /// True when the caller should send the user back to the login screen.
    pub fn requires_login(&self) -> bool {
        matches!(self, ClientError::Api { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }

    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api {
                code: Some(ErrorCode::ValidationFailed),
                message,
                ..
            } => message.clone(),
            ClientError::Api {
                code: Some(code), ..
            } => code.user_message().to_string(),
            ClientError::Api { message, .. } if !message.is_empty() => message.clone(),
            ClientError::Api { .. } => ErrorCode::InternalError.user_message().to_string(),
            ClientError::Transport(_) => "Could not reach the server. Please try again.".to_string(),
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Api {
                status,
                code: Some(code),
                message,
            } => write!(f, "{status} {code}: {message}"),
            ClientError::Api {
                status, message, ..
            } => write!(f, "{status}: {message}"),
            ClientError::Transport(e) => write!(f, "Transport error: {e}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e)
    }
}

#[derive(Debug, Deserialize)]
pub struct SignupResult {
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct LoginResult {
    jwt_token: String,
    user_id: Uuid,
    username: String,
}

#[derive(Debug, Deserialize)]
pub struct Created {
    pub message: String,
    pub employee_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PhotoUploaded {
    pub message: String,
    pub photo_url: String,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<String>,
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct SignupBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://localhost:3001`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    fn authed(&self, req: RequestBuilder, session: &Session) -> RequestBuilder {
        req.bearer_auth(&session.token)
    }

    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<SignupResult, ClientError> {
        let resp = self
            .http
            .post(self.url("/user/signup"))
            .json(&SignupBody {
                username,
                email,
                password,
            })
            .send()
            .await?;
        read_json(resp).await
    }

    /// Log in with a username or an email address.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<Session, ClientError> {
        let identifier = identifier.trim();
        let body = if identifier.contains('@') {
            json!({ "email": identifier, "password": password })
        } else {
            json!({ "username": identifier, "password": password })
        };

        let resp = self
            .http
            .post(self.url("/user/login"))
            .json(&body)
            .send()
            .await?;
        let result: LoginResult = read_json(resp).await?;

        Ok(Session {
            token: result.jwt_token,
            user_id: result.user_id,
            username: result.username,
        })
    }

    pub async fn list_employees(
        &self,
        session: &Session,
    ) -> Result<Vec<EmployeeResponse>, ClientError> {
        let req = self.http.get(self.url("/emp/employees"));
        let resp = self.authed(req, session).send().await?;
        read_json(resp).await
    }

    pub async fn create_employee(
        &self,
        session: &Session,
        input: &EmployeeInput,
    ) -> Result<Created, ClientError> {
        let req = self.http.post(self.url("/emp/employees")).json(input);
        let resp = self.authed(req, session).send().await?;
        read_json(resp).await
    }

    pub async fn get_employee(
        &self,
        session: &Session,
        id: Uuid,
    ) -> Result<EmployeeResponse, ClientError> {
        let req = self.http.get(self.url(&format!("/emp/employees/{id}")));
        let resp = self.authed(req, session).send().await?;
        read_json(resp).await
    }

    /// Returns the server's confirmation message.
    pub async fn update_employee(
        &self,
        session: &Session,
        id: Uuid,
        patch: &EmployeePatch,
    ) -> Result<String, ClientError> {
        let req = self
            .http
            .put(self.url(&format!("/emp/employees/{id}")))
            .json(patch);
        let resp = self.authed(req, session).send().await?;
        let body: MessageBody = read_json(resp).await?;
        Ok(body.message)
    }

    pub async fn delete_employee(&self, session: &Session, id: Uuid) -> Result<(), ClientError> {
        let req = self.http.delete(self.url(&format!("/emp/employees?eid={id}")));
        let resp = self.authed(req, session).send().await?;
        check_status(resp).await.map(|_| ())
    }

    pub async fn upload_photo(
        &self,
        session: &Session,
        id: Uuid,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<PhotoUploaded, ClientError> {
        let part = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("photo", part);

        let req = self
            .http
            .post(self.url(&format!("/emp/employees/{id}/photo")))
            .multipart(form);
        let resp = self.authed(req, session).send().await?;
        read_json(resp).await
    }
}

async fn check_status(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.code.and_then(|c| c.parse().ok()), body.message),
        Err(_) => (None, text),
    };
    tracing::debug!(%status, ?code, "API call failed");

    Err(ClientError::Api {
        status,
        code,
        message,
    })
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let resp = check_status(resp).await?;
    Ok(resp.json().await?)
}

/// The list page's search: keep employees whose name, email, position or
/// department contains `query`, ignoring case.
pub fn filter_employees(list: &[EmployeeResponse], query: &str) -> Vec<EmployeeResponse> {
    list.iter().filter(|e| e.matches(query)).cloned().collect()
}
