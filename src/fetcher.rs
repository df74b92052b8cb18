use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, trace};

use crate::client::DictClient;
use crate::dataset::DatasetDescriptor;
use crate::domain::Message;

/// A read the model wants performed. `seq` is the generation number the
/// model uses to drop superseded responses.
#[derive(Debug)]
pub enum FetchRequest {
    Page {
        seq: u64,
        dataset: &'static DatasetDescriptor,
        offset: usize,
        length: usize,
    },
    Stats {
        seq: u64,
        dataset: &'static DatasetDescriptor,
    },
}

/// Runs the client on its own thread so network reads never block the
/// event loop. Requests are served strictly in order; the thread ends when
/// either channel closes.
pub fn spawn(
    client: DictClient,
    requests: Receiver<FetchRequest>,
    outcomes: Sender<Message>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("fetcher".to_string())
        .spawn(move || {
            while let Ok(request) = requests.recv() {
                trace!("Serving {request:?}");
                let start_time = Instant::now();
                let message = match request {
                    FetchRequest::Page {
                        seq,
                        dataset,
                        offset,
                        length,
                    } => Message::PageFetched(seq, client.fetch_page(dataset, offset, length)),
                    FetchRequest::Stats { seq, dataset } => {
                        Message::StatsFetched(seq, client.fetch_total(dataset))
                    }
                };
                debug!("Fetch took {}ms", start_time.elapsed().as_millis());
                if outcomes.send(message).is_err() {
                    break;
                }
            }
        })
}
