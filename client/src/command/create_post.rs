//! [`Command`] for authoring a new [`Post`].

use std::error::Error as StdError;

use common::{operations::Insert, DateTime};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{post, Post},
    gate,
    infra::Backend,
    Client,
};

use super::Command;

/// [`Command`] for authoring a new [`Post`] in the community feed.
#[derive(Clone, Debug, From)]
pub struct CreatePost {
    /// [`post::Content`] of the new [`Post`].
    pub content: post::Content,
}

impl<B, E> Command<CreatePost> for Client<B>
where
    B: Backend<Insert<Post>, Ok = (), Err = Traced<E>> + Clone + 'static,
    E: StdError + 'static,
{
    type Ok = Post;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreatePost) -> Result<Self::Ok, Self::Err> {
        let CreatePost { content } = cmd;

        let author_id = self
            .gate()
            .principal()
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;

        let post = Post {
            id: post::Id::new(),
            author_id,
            content,
            created_at: DateTime::now().coerce(),
        };

        // Writes are never coalesced with each other: a random per-call ID
        // in the key makes retries distinct operations.
        #[expect(unsafe_code, reason = "never empty")]
        let key = unsafe {
            gate::Key::new_unchecked(format!("posts:insert:{}", post.id))
        };

        let backend = self.backend().clone();
        let inserted = post.clone();
        self.gate()
            .execute(key, true, move || async move {
                backend.execute(Insert(inserted)).await
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;

        Ok(post)
    }
}

/// Error of [`CreatePost`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Gate`] error.
    ///
    /// [`Gate`]: crate::Gate
    #[display("`Gate` operation failed: {_0}")]
    Gate(gate::ExecutionError),
}
