//! [`Command`] for resolving the authentication [`Session`].

use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::user::session,
    gate::Session,
    Client,
};

use super::Command;

/// [`Command`] for resolving the authentication [`Session`].
///
/// Issued by the hosting application on every upstream auth change: initial
/// resolution, login, logout and token refresh all funnel through here, with
/// a [`None`] `token` meaning an anonymous [`Session`].
#[derive(Clone, Debug, From)]
pub struct ResolveSession {
    /// Access token to resolve the [`Session`] from, if any.
    pub token: Option<session::Token>,
}

impl<B> Command<ResolveSession> for Client<B> {
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ResolveSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ResolveSession { token } = cmd;

        let principal = token
            .map(|token| {
                jsonwebtoken::decode::<session::Claims>(
                    token.expose(),
                    &self.config().jwt_decoding_key,
                    &Validation::default(),
                )
                .map(|data| data.claims.user_id)
            })
            .transpose()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let session = Session {
            principal,
            is_loaded: true,
        };
        tracing::debug!(
            authenticated = session.principal.is_some(),
            "session resolved",
        );
        self.gate().set_session(session);

        Ok(session)
    }
}

/// Error of [`ResolveSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use jsonwebtoken::{EncodingKey, Header};

    use crate::{
        command::Command as _,
        domain::user::{self, session},
        infra::backend::Memory,
        Client, Config,
    };

    use super::ResolveSession;

    const SECRET: &[u8] = b"top-secret";

    fn client() -> Client<Memory> {
        Client::new(
            Config::new(jsonwebtoken::DecodingKey::from_secret(SECRET)),
            Memory::default(),
        )
    }

    fn token(user_id: user::Id, expires_in: i64) -> session::Token {
        let claims = session::Claims {
            user_id,
            expires_at: DateTime::from_unix_timestamp(
                DateTime::now().unix_timestamp() + expires_in,
            )
            .unwrap()
            .coerce(),
        };
        session::Token::new(
            jsonwebtoken::encode(
                &Header::default(),
                &claims,
                &EncodingKey::from_secret(SECRET),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn resolves_a_valid_token_into_a_principal() {
        let client = client();
        let user_id = user::Id::new();

        let session = client
            .execute(ResolveSession {
                token: Some(token(user_id, 3600)),
            })
            .await
            .unwrap();

        assert_eq!(session.principal, Some(user_id));
        assert!(session.is_loaded);
        assert_eq!(client.gate().session(), session);
    }

    #[tokio::test]
    async fn resolves_no_token_into_an_anonymous_session() {
        let client = client();

        let session =
            client.execute(ResolveSession { token: None }).await.unwrap();

        assert_eq!(session.principal, None);
        assert!(session.is_loaded);
        assert!(client.gate().session().is_loaded);
    }

    #[tokio::test]
    async fn rejects_an_expired_token() {
        let client = client();

        // Beyond the default 60 seconds leeway.
        let result = client
            .execute(ResolveSession {
                token: Some(token(user::Id::new(), -3600)),
            })
            .await;

        assert!(result.is_err());
        assert!(!client.gate().session().is_loaded);
    }
}
