//! Auth endpoints of the VH3 gateway.

use async_trait::async_trait;
use serde_json::json;

use crate::backend::error::ApiError;
use crate::backend::http::HttpApi;
use crate::backend::types::{AuthResponseDto, UserDto};
use crate::domain::user::User;
use crate::usecases::auth::{AuthGateway, AuthSourceError, Credentials, SignupRequest};

#[derive(Debug, Clone)]
pub struct AuthApi {
    http: HttpApi,
}

impl AuthApi {
    pub fn new(http: HttpApi) -> Self {
        Self { http }
    }

    fn extract_token(response: AuthResponseDto) -> Result<String, AuthSourceError> {
        match response.auth_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(AuthSourceError::InvalidResponse),
        }
    }
}

#[async_trait]
impl AuthGateway for AuthApi {
    async fn login(&self, credentials: &Credentials) -> Result<String, AuthSourceError> {
        let response: AuthResponseDto = self
            .http
            .post_json(
                "/auth/login",
                &json!({
                    "email": credentials.email,
                    "password": credentials.password,
                }),
            )
            .await
            .map_err(map_api_error)?;

        Self::extract_token(response)
    }

    async fn signup(&self, request: &SignupRequest) -> Result<String, AuthSourceError> {
        let response: AuthResponseDto = self
            .http
            .post_json(
                "/auth/signup",
                &json!({
                    "username": request.username,
                    "first_name": request.first_name,
                    "last_name": request.last_name,
                    "email": request.email,
                    "password": request.password,
                    "phone": request.phone,
                }),
            )
            .await
            .map_err(map_api_error)?;

        Self::extract_token(response)
    }

    async fn fetch_me(&self) -> Result<User, AuthSourceError> {
        let user: UserDto = self
            .http
            .get_json("/auth/me", &[])
            .await
            .map_err(map_api_error)?;

        Ok(user.into_user())
    }
}

fn map_api_error(error: ApiError) -> AuthSourceError {
    match error {
        ApiError::Status { status, message } => AuthSourceError::Status {
            status,
            message: if message.is_empty() {
                None
            } else {
                Some(message)
            },
        },
        ApiError::Transport(source) => AuthSourceError::Transport(source.to_string()),
        ApiError::Io(source) => AuthSourceError::Transport(source.to_string()),
        ApiError::Decode(_) => AuthSourceError::InvalidResponse,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_an_invalid_response() {
        let response = AuthResponseDto {
            auth_token: Some(String::new()),
        };

        assert_eq!(
            AuthApi::extract_token(response),
            Err(AuthSourceError::InvalidResponse)
        );
    }

    #[test]
    fn status_error_keeps_server_message() {
        let mapped = map_api_error(ApiError::Status {
            status: 403,
            message: "bad credentials".to_string(),
        });

        assert_eq!(
            mapped,
            AuthSourceError::Status {
                status: 403,
                message: Some("bad credentials".to_string()),
            }
        );
    }

    #[test]
    fn io_failures_map_to_transport() {
        let source = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");

        let mapped = map_api_error(ApiError::Io(source));

        assert!(matches!(mapped, AuthSourceError::Transport(_)));
    }

    #[test]
    fn blank_server_message_maps_to_none() {
        let mapped = map_api_error(ApiError::Status {
            status: 500,
            message: String::new(),
        });

        assert_eq!(
            mapped,
            AuthSourceError::Status {
                status: 500,
                message: None,
            }
        );
    }
}
