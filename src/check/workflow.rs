//! Bulk bio-check workflow.
//!
//! A run goes through these steps:
//! 1. Refuse to start unless the WhatsApp connection is open
//! 2. Deduplicate the input numbers
//! 3. Check registration for all of them in one request (all-or-nothing)
//! 4. Fetch bios of registered numbers in batches; fetches inside a batch run
//!    concurrently and the next batch waits until every fetch has settled
//! 5. Classify each number and assemble the report
//!
//! A failed bio fetch is indistinguishable from a private or empty bio, so all
//! three land in the "no bio" class.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use super::{BioEntry, CheckError, ProgressSnapshot, Report};
use crate::config::CheckSettings;
use crate::numbers::{Address, mask_phone, unique_numbers};
use crate::progress::ProgressSink;
use crate::whatsapp::{ExistenceResult, MessagingClient};

/// Result of fetching one registered number's bio.
#[derive(Debug)]
enum FetchOutcome {
    WithBio(BioEntry),
    NoBio(String),
}

/// Runs bio checks against a messaging client.
pub struct BioChecker {
    client: Arc<dyn MessagingClient>,
    batch_size: usize,
    batch_pause: Duration,
}

impl BioChecker {
    /// Creates a checker using the batch settings from `settings`.
    #[must_use]
    pub fn new(client: Arc<dyn MessagingClient>, settings: &CheckSettings) -> Self {
        Self {
            client,
            batch_size: settings.batch_size.max(1),
            batch_pause: settings.batch_pause(),
        }
    }

    /// Sets the number of concurrent fetches per batch (at least 1).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Sets the pause between batches.
    #[must_use]
    pub const fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    /// Checks the bios of `numbers`, pushing progress into `progress`.
    ///
    /// # Errors
    ///
    /// - [`CheckError::NotReady`] if the client is not connected
    /// - [`CheckError::EmptyInput`] if no numbers remain after deduplication
    /// - [`CheckError::ExistenceQuery`] if the registration check fails
    pub async fn check_bio<S: AsRef<str> + Sync>(
        &self,
        numbers: &[S],
        progress: &mut dyn ProgressSink,
    ) -> Result<Report, CheckError> {
        let state = self.client.connection_state();
        if !state.is_open() {
            return Err(CheckError::NotReady(state));
        }

        let unique = unique_numbers(numbers);
        if unique.is_empty() {
            return Err(CheckError::EmptyInput);
        }

        let started_at = Utc::now();
        let timer = Instant::now();
        info!(
            "Starting bio check: {} numbers ({} unique)",
            numbers.len(),
            unique.len()
        );

        progress
            .push(&format!("🔍 Checking registration ({})...", unique.len()))
            .await;

        let addresses: Vec<Address> = unique.iter().map(|n| Address::for_number(n)).collect();
        let answers = self
            .client
            .check_exists(&addresses)
            .await
            .map_err(CheckError::ExistenceQuery)?;
        let (registered, not_registered) = partition_registered(addresses, answers);

        let total_batches = registered.len().div_ceil(self.batch_size);
        let mut snapshot = ProgressSnapshot {
            unique: unique.len(),
            registered: registered.len(),
            not_registered: not_registered.len(),
            total_batches,
            ..ProgressSnapshot::default()
        };
        debug!(
            "{} registered, {} not registered, {} batches",
            registered.len(),
            not_registered.len(),
            total_batches
        );
        progress.push(&snapshot.to_string()).await;

        let mut with_bio = Vec::new();
        let mut no_bio = Vec::new();

        for (index, batch) in registered.chunks(self.batch_size).enumerate() {
            let outcomes = join_all(batch.iter().map(|address| self.fetch_bio(address))).await;

            for outcome in outcomes {
                match outcome {
                    FetchOutcome::WithBio(entry) => with_bio.push(entry),
                    FetchOutcome::NoBio(number) => no_bio.push(number),
                }
            }

            snapshot.batch = index + 1;
            snapshot.with_bio = with_bio.len();
            snapshot.no_bio = no_bio.len();
            progress.push(&snapshot.to_string()).await;

            if snapshot.batch < total_batches && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        let report = Report {
            total_input: numbers.len(),
            unique_count: unique.len(),
            registered_count: registered.len(),
            with_bio,
            no_bio,
            not_registered,
            started_at,
            elapsed: timer.elapsed(),
        };

        info!(
            "Bio check finished in {:?}: {} with bio, {} without, {} not registered",
            report.elapsed,
            report.with_bio.len(),
            report.no_bio.len(),
            report.not_registered.len()
        );
        progress.finish(&report.summary()).await;

        Ok(report)
    }

    async fn fetch_bio(&self, address: &Address) -> FetchOutcome {
        let number = address.number().to_owned();

        match self.client.fetch_status(address).await {
            Ok(status) => match status.bio() {
                Some(bio) => FetchOutcome::WithBio(BioEntry {
                    bio: bio.to_owned(),
                    set_at: status.set_at,
                    number,
                }),
                None => FetchOutcome::NoBio(number),
            },
            Err(e) => {
                warn!("Bio fetch failed for {}: {}", mask_phone(&number), e);
                FetchOutcome::NoBio(number)
            }
        }
    }
}

/// Splits addresses into registered ones and bare unregistered numbers.
///
/// Input order is kept. An address the client did not answer for counts as
/// not registered.
fn partition_registered(
    addresses: Vec<Address>,
    answers: Vec<ExistenceResult>,
) -> (Vec<Address>, Vec<String>) {
    let exists: HashMap<Address, bool> = answers
        .into_iter()
        .map(|answer| (answer.address, answer.exists))
        .collect();

    let mut registered = Vec::new();
    let mut not_registered = Vec::new();
    for address in addresses {
        if exists.get(&address).copied().unwrap_or(false) {
            registered.push(address);
        } else {
            not_registered.push(address.number().to_owned());
        }
    }
    (registered, not_registered)
}

impl std::fmt::Debug for BioChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BioChecker")
            .field("batch_size", &self.batch_size)
            .field("batch_pause", &self.batch_pause)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::check::CheckError;
    use crate::whatsapp::{ClientError, ConnectionState, StatusRecord};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Start(String),
        End(String),
    }

    #[derive(Default)]
    struct FakeClient {
        open: bool,
        fail_exists: bool,
        registered: HashSet<String>,
        bios: HashMap<String, Option<String>>,
        failing: HashSet<String>,
        exists_calls: Mutex<Vec<Vec<Address>>>,
        events: Mutex<Vec<Event>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeClient {
        fn connected() -> Self {
            Self {
                open: true,
                ..Self::default()
            }
        }

        fn register(mut self, number: &str, bio: Option<&str>) -> Self {
            self.registered.insert(number.to_owned());
            self.bios.insert(number.to_owned(), bio.map(str::to_owned));
            self
        }

        fn failing_fetch(mut self, number: &str) -> Self {
            self.registered.insert(number.to_owned());
            self.failing.insert(number.to_owned());
            self
        }

        fn exists_calls(&self) -> Vec<Vec<Address>> {
            self.exists_calls.lock().unwrap().clone()
        }

        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessagingClient for FakeClient {
        fn connection_state(&self) -> ConnectionState {
            if self.open {
                ConnectionState::Open
            } else {
                ConnectionState::Closed
            }
        }

        async fn check_exists(
            &self,
            addresses: &[Address],
        ) -> Result<Vec<ExistenceResult>, ClientError> {
            self.exists_calls.lock().unwrap().push(addresses.to_vec());
            if self.fail_exists {
                return Err(ClientError::Request("connection reset".to_owned()));
            }
            Ok(addresses
                .iter()
                .map(|address| ExistenceResult {
                    address: address.clone(),
                    exists: self.registered.contains(address.number()),
                })
                .collect())
        }

        async fn fetch_status(&self, address: &Address) -> Result<StatusRecord, ClientError> {
            let number = address.number().to_owned();
            self.events.lock().unwrap().push(Event::Start(number.clone()));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            for _ in 0..3 {
                tokio::task::yield_now().await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.events.lock().unwrap().push(Event::End(number.clone()));

            if self.failing.contains(&number) {
                return Err(ClientError::Status {
                    status: 403,
                    body: "privacy".to_owned(),
                });
            }
            Ok(StatusRecord {
                text: self.bios.get(&number).cloned().flatten(),
                set_at: None,
            })
        }

        async fn request_pairing_code(&self, _phone: &str) -> Result<String, ClientError> {
            Ok("ABCD-1234".to_owned())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        pushes: Vec<String>,
        finished: Vec<String>,
    }

    #[async_trait]
    impl ProgressSink for RecordingSink {
        async fn push(&mut self, text: &str) {
            self.pushes.push(text.to_owned());
        }

        async fn finish(&mut self, text: &str) {
            self.finished.push(text.to_owned());
        }
    }

    fn checker(client: &Arc<FakeClient>, batch_size: usize) -> BioChecker {
        let client: Arc<dyn MessagingClient> = Arc::clone(client) as Arc<dyn MessagingClient>;
        BioChecker::new(client, &CheckSettings::default())
            .with_batch_size(batch_size)
            .with_batch_pause(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_classes_are_disjoint_and_cover_input() {
        let client = Arc::new(
            FakeClient::connected()
                .register("628100001", Some("Hello"))
                .register("628100002", None)
                .register("628100003", Some("   "))
                .failing_fetch("628100004"),
        );
        let input = [
            "628100001", "628100002", "628100003", "628100004", "628100005", "628100001",
        ];
        let mut sink = RecordingSink::default();

        let report = checker(&client, 2).check_bio(&input, &mut sink).await.unwrap();

        assert_eq!(report.total_input, 6);
        assert_eq!(report.unique_count, 5);
        assert_eq!(report.registered_count, 4);
        assert_eq!(report.with_bio.len(), 1);
        assert_eq!(report.with_bio[0].number, "628100001");
        assert_eq!(report.with_bio[0].bio, "Hello");
        assert_eq!(report.no_bio, vec!["628100002", "628100003", "628100004"]);
        assert_eq!(report.not_registered, vec!["628100005"]);

        let mut seen = HashSet::new();
        let all = report
            .with_bio
            .iter()
            .map(|e| e.number.as_str())
            .chain(report.no_bio.iter().map(String::as_str))
            .chain(report.not_registered.iter().map(String::as_str));
        for number in all {
            assert!(seen.insert(number), "{number} classified twice");
        }
        let expected: HashSet<&str> = input.iter().copied().collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_duplicates_query_once() {
        let client = Arc::new(FakeClient::connected());
        let mut sink = RecordingSink::default();

        let report = checker(&client, 15)
            .check_bio(&["628100", "628100", "628200"], &mut sink)
            .await
            .unwrap();

        let calls = client.exists_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(report.unique_count, 2);
        assert_eq!(report.not_registered, vec!["628100", "628200"]);
    }

    #[tokio::test]
    async fn test_batches_run_in_sequence() {
        let numbers = ["628000001", "628000002", "628000003", "628000004", "628000005"];
        let mut client = FakeClient::connected();
        for number in numbers {
            client = client.register(number, Some("bio"));
        }
        let client = Arc::new(client);
        let mut sink = RecordingSink::default();

        let report = checker(&client, 2).check_bio(&numbers, &mut sink).await.unwrap();
        assert_eq!(report.with_bio.len(), 5);

        let batch_pushes: Vec<&String> = sink
            .pushes
            .iter()
            .filter(|p| p.starts_with("🔄 Batch") && !p.starts_with("🔄 Batch 0/"))
            .collect();
        assert_eq!(batch_pushes.len(), 3);
        assert!(batch_pushes[2].starts_with("🔄 Batch 3/3"));

        // Every fetch of a batch ends before any fetch of the next one starts.
        let events = client.events();
        let batches: Vec<&[&str]> = numbers.chunks(2).collect();
        assert_eq!(batches.iter().map(|b| b.len()).collect::<Vec<_>>(), vec![2, 2, 1]);
        let position = |event: &Event| events.iter().position(|e| e == event).unwrap();
        for pair in batches.windows(2) {
            let last_end = pair[0]
                .iter()
                .map(|n| position(&Event::End((*n).to_owned())))
                .max()
                .unwrap();
            let first_start = pair[1]
                .iter()
                .map(|n| position(&Event::Start((*n).to_owned())))
                .min()
                .unwrap();
            assert!(last_end < first_start);
        }

        assert_eq!(client.max_in_flight.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let client = Arc::new(FakeClient::connected());
        let mut sink = RecordingSink::default();
        let empty: [&str; 0] = [];

        let result = checker(&client, 15).check_bio(&empty, &mut sink).await;

        assert!(matches!(result, Err(CheckError::EmptyInput)));
        assert!(client.exists_calls().is_empty());
        assert!(client.events().is_empty());
        assert!(sink.pushes.is_empty());
    }

    #[tokio::test]
    async fn test_not_ready_when_disconnected() {
        let client = Arc::new(FakeClient::default());
        let mut sink = RecordingSink::default();

        let result = checker(&client, 15).check_bio(&["628123456"], &mut sink).await;

        assert!(matches!(
            result,
            Err(CheckError::NotReady(ConnectionState::Closed))
        ));
        assert!(client.exists_calls().is_empty());
    }

    #[tokio::test]
    async fn test_existence_failure_aborts() {
        let client = Arc::new(FakeClient {
            fail_exists: true,
            ..FakeClient::connected().register("628123456", Some("bio"))
        });
        let mut sink = RecordingSink::default();

        let result = checker(&client, 15).check_bio(&["628123456"], &mut sink).await;

        assert!(matches!(result, Err(CheckError::ExistenceQuery(_))));
        assert_eq!(client.exists_calls().len(), 1);
        assert!(client.events().is_empty());
        assert!(sink.finished.is_empty());
    }

    #[tokio::test]
    async fn test_no_registered_numbers() {
        let client = Arc::new(FakeClient::connected());
        let mut sink = RecordingSink::default();

        let report = checker(&client, 15)
            .check_bio(&["628123456", "628654321"], &mut sink)
            .await
            .unwrap();

        assert_eq!(report.registered_count, 0);
        assert!(report.with_bio.is_empty());
        assert!(report.no_bio.is_empty());
        assert_eq!(report.not_registered.len(), 2);
        assert!(client.events().is_empty());
        assert_eq!(sink.finished.len(), 1);
    }

    #[tokio::test]
    async fn test_finish_carries_summary() {
        let client = Arc::new(FakeClient::connected().register("628123456", Some("hi")));
        let mut sink = RecordingSink::default();

        checker(&client, 15)
            .check_bio(&["628123456"], &mut sink)
            .await
            .unwrap();

        assert_eq!(sink.finished.len(), 1);
        assert!(sink.finished[0].contains("With bio: 1"));
    }

    #[test]
    fn test_partition_treats_missing_answer_as_unregistered() {
        let a = Address::for_number("628111111");
        let b = Address::for_number("628222222");
        let answers = vec![ExistenceResult {
            address: a.clone(),
            exists: true,
        }];

        let (registered, not_registered) = partition_registered(vec![a.clone(), b], answers);

        assert_eq!(registered, vec![a]);
        assert_eq!(not_registered, vec!["628222222"]);
    }
}
