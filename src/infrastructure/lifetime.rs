use tokio::sync::watch;

#[derive(Clone)]
pub struct PageLifetime {
    sender: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct UnloadListener {
    receiver: watch::Receiver<bool>,
}

impl PageLifetime {
    pub fn new() -> (Self, UnloadListener) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, UnloadListener { receiver })
    }

    pub fn listener(&self) -> UnloadListener {
        UnloadListener {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn unload(&self) {
        self.sender.send_replace(true);
    }
}

impl UnloadListener {
    pub async fn unloaded(&mut self) {
        if *self.receiver.borrow() {
            return;
        }
        let _ = self.receiver.changed().await;
    }

    pub fn is_unloaded(&self) -> bool {
        *self.receiver.borrow()
    }
}

pub fn unload_on_signal(lifetime: PageLifetime) {
    let ctrlc = lifetime.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(target: "app", "interrupt received; unloading page");
            ctrlc.unload();
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let term = lifetime.clone();
        tokio::spawn(async move {
            if let Ok(mut sig) = signal(SignalKind::terminate()) {
                sig.recv().await;
                term.unload();
            }
        });
    }
}
