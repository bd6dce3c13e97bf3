use {
    secrecy::Secret,
    tracing::{debug, warn},
    url::Url,
};

use crate::{Error, Result, types::OAuthTokens};

/// Exchanges an OAuth2 authorization code for tokens at a provider's token
/// endpoint (RFC 6749 §4.1.3, client credentials in the form body).
#[derive(Debug, Clone)]
pub struct CodeExchange {
    token_url: Url,
    redirect_uri: Option<String>,
    client: reqwest::Client,
}

impl CodeExchange {
    pub fn new(token_url: &str) -> Result<Self> {
        Ok(Self {
            token_url: Url::parse(token_url)?,
            redirect_uri: None,
            client: reqwest::Client::new(),
        })
    }

    /// Redirect URI sent along with the code. Providers that registered one
    /// for the authorization request require the same value here.
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Exchange `code` for tokens using the given client credentials.
    pub async fn exchange(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<OAuthTokens> {
        let mut form = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("client_id", client_id.to_string()),
            ("client_secret", client_secret.to_string()),
        ];
        if let Some(redirect_uri) = &self.redirect_uri {
            form.push(("redirect_uri", redirect_uri.clone()));
        }

        debug!(token_url = %self.token_url, client_id, "exchanging oauth2 code");

        let resp = self
            .client
            .post(self.token_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        let value: serde_json::Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => {
                warn!(token_url = %self.token_url, %status, "token endpoint returned non-JSON error");
                return Err(Error::message(format!(
                    "token endpoint returned {status}"
                )));
            },
        };

        if let Some(error) = value.get("error").and_then(serde_json::Value::as_str) {
            let description = value
                .get("error_description")
                .and_then(serde_json::Value::as_str)
                .map(ToString::to_string);
            warn!(token_url = %self.token_url, error, "oauth2 code exchange rejected");
            return Err(Error::provider(error, description));
        }
        if !status.is_success() {
            return Err(Error::message(format!("token endpoint returned {status}")));
        }

        parse_token_response(&value)
    }
}

fn parse_token_response(resp: &serde_json::Value) -> Result<OAuthTokens> {
    let access_token = resp["access_token"]
        .as_str()
        .ok_or_else(|| Error::message("missing access_token in response"))?
        .to_string();

    let refresh_token = resp["refresh_token"].as_str().map(|s| s.to_string());
    let token_type = resp["token_type"].as_str().map(|s| s.to_string());

    let expires_at = resp["expires_in"].as_u64().and_then(|secs| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs() + secs)
    });

    Ok(OAuthTokens {
        access_token: Secret::new(access_token),
        refresh_token: refresh_token.map(Secret::new),
        token_type,
        expires_at,
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher, secrecy::ExposeSecret};

    #[test]
    fn rejects_invalid_token_url() {
        assert!(CodeExchange::new("not a url").is_err());
    }

    #[test]
    fn parses_minimal_response() {
        let tokens = parse_token_response(&serde_json::json!({
            "access_token": "abc"
        }))
        .unwrap();
        assert_eq!(tokens.access_token.expose_secret(), "abc");
        assert!(tokens.refresh_token.is_none());
        assert!(tokens.expires_at.is_none());
    }

    #[test]
    fn missing_access_token_is_an_error() {
        let err = parse_token_response(&serde_json::json!({ "token_type": "Bearer" }))
            .unwrap_err();
        assert!(err.to_string().contains("access_token"));
    }

    #[tokio::test]
    async fn exchange_posts_code_and_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                Matcher::UrlEncoded("code".into(), "the-code".into()),
                Matcher::UrlEncoded("client_id".into(), "id-1".into()),
                Matcher::UrlEncoded("client_secret".into(), "s3cret".into()),
                Matcher::UrlEncoded("redirect_uri".into(), "http://localhost/cb".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "access_token": "access-1",
                    "refresh_token": "refresh-1",
                    "token_type": "Bearer",
                    "expires_in": 3600
                })
                .to_string(),
            )
            .create_async()
            .await;

        let exchange = CodeExchange::new(&format!("{}/oauth/token", server.url()))
            .unwrap()
            .with_redirect_uri("http://localhost/cb");
        let tokens = exchange.exchange("id-1", "s3cret", "the-code").await.unwrap();

        assert_eq!(tokens.access_token.expose_secret(), "access-1");
        assert_eq!(
            tokens
                .refresh_token
                .as_ref()
                .map(|s| s.expose_secret().as_str()),
            Some("refresh-1")
        );
        assert_eq!(tokens.token_type.as_deref(), Some("Bearer"));
        assert!(tokens.expires_at.is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn exchange_surfaces_provider_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"invalid_grant","error_description":"code expired"}"#)
            .create_async()
            .await;

        let exchange = CodeExchange::new(&format!("{}/token", server.url())).unwrap();
        let err = exchange.exchange("id", "secret", "stale").await.unwrap_err();
        match err {
            Error::Provider { error, description } => {
                assert_eq!(error, "invalid_grant");
                assert_eq!(description.as_deref(), Some("code expired"));
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn exchange_non_json_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let exchange = CodeExchange::new(&format!("{}/token", server.url())).unwrap();
        let err = exchange.exchange("id", "secret", "code").await.unwrap_err();
        assert!(err.to_string().contains("502"));
    }
}
