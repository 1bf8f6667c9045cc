use chatwire_core::Role;
use chatwire_session::SessionUpdate;
use std::io::{self, Write};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::warn;

/// Writes session updates to the terminal as they are drained.
pub struct Renderer {
    updates: broadcast::Receiver<SessionUpdate>,
    echo_user: bool,
}

impl Renderer {
    pub fn new(updates: broadcast::Receiver<SessionUpdate>) -> Self {
        Self {
            updates,
            echo_user: false,
        }
    }

    /// Also print the user's own question (for one-shot mode).
    pub fn echo_user(mut self, echo: bool) -> Self {
        self.echo_user = echo;
        self
    }

    /// Renders every pending update.
    pub fn flush(&mut self, out: &mut impl Write) -> io::Result<()> {
        loop {
            match self.updates.try_recv() {
                Ok(update) => self.render(update, out)?,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Renderer fell behind; some output was dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        out.flush()
    }

    fn render(&self, update: SessionUpdate, out: &mut impl Write) -> io::Result<()> {
        match update {
            SessionUpdate::Reset { session_id } => writeln!(out, "-- session {session_id} --"),
            SessionUpdate::MessageAdded { role, content, .. } => match role {
                Role::User if self.echo_user => writeln!(out, "you> {content}"),
                Role::User => Ok(()),
                Role::Assistant => write!(out, "assistant> {content}"),
                Role::System => writeln!(out, "\n{content}"),
            },
            SessionUpdate::MessageRemoved { .. } => Ok(()),
            SessionUpdate::ContentAppended { delta, .. } => write!(out, "{delta}"),
            SessionUpdate::LoadingChanged { loading: false } => writeln!(out),
            SessionUpdate::LoadingChanged { loading: true } => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chatwire_session::{Session, TranscriptAssembler};

    #[test]
    fn renders_a_streamed_turn() {
        let mut session = Session::new();
        let mut renderer = Renderer::new(session.subscribe()).echo_user(true);

        let assembler = TranscriptAssembler::new(session.begin_turn("hello").unwrap());
        assembler.apply_content(&mut session, "Hi");
        assembler.apply_content(&mut session, " there");
        session.finish_turn();

        let mut out = Vec::new();
        renderer.flush(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "you> hello\nassistant> Hi there\n"
        );
    }

    #[test]
    fn renders_system_notice_and_reset() {
        let mut session = Session::new();
        let mut renderer = Renderer::new(session.subscribe());

        session.begin_turn("q").unwrap();
        session.push_system("⚠️ quota exceeded");
        session.finish_turn();
        let id = session.restart().clone();

        let mut out = Vec::new();
        renderer.flush(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("assistant> \n⚠️ quota exceeded\n\n"), "{text:?}");
        assert!(text.ends_with(&format!("-- session {id} --\n")));
    }
}
