use std::sync::Arc;

use arboard::Clipboard;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, trace, warn};

use crate::catalog::CatalogSource;
use crate::domain::{Command, Message};
use crate::session::SessionStore;

/// Executes the commands produced by the model.
///
/// Fetches are spawned on the tokio runtime and report back through a channel
/// the ui loop drains between frames. Nothing here touches the model.
pub struct Runtime<C: CatalogSource> {
    catalog: Arc<C>,
    store: SessionStore,
    clipboard: Option<Clipboard>,
    handle: Handle,
    sender: UnboundedSender<Message>,
    receiver: UnboundedReceiver<Message>,
}

impl<C: CatalogSource> Runtime<C> {
    pub fn new(catalog: C, store: SessionStore, clipboard: Option<Clipboard>, handle: Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            catalog: Arc::new(catalog),
            store,
            clipboard,
            handle,
            sender,
            receiver,
        }
    }

    pub fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            trace!("Executing {:?}", command);
            match command {
                Command::Login(credentials) => {
                    self.spawn(move |catalog: Arc<C>| async move {
                        Message::LoginFinished(catalog.login(credentials).await)
                    });
                }
                Command::FetchProducts { mount } => {
                    self.spawn(move |catalog: Arc<C>| async move {
                        Message::ProductsLoaded {
                            mount,
                            result: catalog.fetch_products().await,
                        }
                    });
                }
                Command::FetchProduct { mount, request } => {
                    self.spawn(move |catalog: Arc<C>| async move {
                        Message::DetailLoaded {
                            mount,
                            request,
                            result: catalog.fetch_product(request.id).await,
                        }
                    });
                }
                Command::PersistSession(session) => {
                    if let Err(e) = self.store.save(&session) {
                        error!("Could not store session in {:?}: {e}", self.store.path());
                    }
                }
                Command::ClearSession => {
                    if let Err(e) = self.store.clear() {
                        error!("Could not clear session in {:?}: {e}", self.store.path());
                    }
                }
                Command::CopyToClipboard(text) => match self.clipboard.as_mut() {
                    Some(clipboard) => match clipboard.set_text(text) {
                        Ok(_) => trace!("Copied row to clipboard."),
                        Err(e) => warn!("Error copying to clipboard: {:?}", e),
                    },
                    None => warn!("No clipboard available"),
                },
            }
        }
    }

    fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(Arc<C>) -> Fut,
        Fut: Future<Output = Message> + Send + 'static,
    {
        let sender = self.sender.clone();
        let future = task(Arc::clone(&self.catalog));
        self.handle.spawn(async move {
            // The receiver is gone once the ui loop ended.
            if sender.send(future.await).is_err() {
                trace!("Ui loop gone, dropping message");
            }
        });
    }

    /// Next finished effect, without waiting.
    pub fn try_next(&mut self) -> Option<Message> {
        self.receiver.try_recv().ok()
    }

    /// Wait for the next finished effect.
    #[cfg(test)]
    pub async fn next(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }
}
