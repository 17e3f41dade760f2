//! End-to-end tests for the run pipeline against the in-memory store.
//!
//! Tests: identity → Orchestrator → Calculator → Store → Run Log, and
//! identity → Recorder → Store → Event.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tokio::sync::Barrier;
    use tokio_util::sync::CancellationToken;

    use assetbook_auth::{AuthzError, ClaimsTenantResolver, JwtClaims, PrincipalId, Role};
    use assetbook_core::{AssetId, ExpectedVersion, Money, Period, TenantId};
    use assetbook_depreciation::{Asset, AssetEvent, AssetStatus, DepreciationEntry, RunStatus};

    use crate::config::RunnerConfig;
    use crate::orchestrator::{DepreciationRunner, RunError, RunRequest};
    use crate::recorder::{RecorderError, StatusRecorder};
    use crate::store::{AssetLedgerStore, InMemoryLedgerStore, RecordOutcome, RunLogStore, StoreError};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn claims(tenant_id: TenantId, role: Role) -> JwtClaims {
        JwtClaims {
            sub: PrincipalId::new(),
            tenant_id,
            roles: vec![role],
            issued_at: now() - chrono::Duration::minutes(1),
            expires_at: now() + chrono::Duration::hours(1),
        }
    }

    fn runner_over<S>(assets: Arc<S>, runs: Arc<InMemoryLedgerStore>, timeout: Duration) -> DepreciationRunner
    where
        S: AssetLedgerStore + 'static,
    {
        DepreciationRunner::new(
            assets,
            runs,
            Arc::new(ClaimsTenantResolver),
            RunnerConfig { run_timeout: timeout },
        )
    }

    fn runner(store: &Arc<InMemoryLedgerStore>) -> DepreciationRunner {
        runner_over(store.clone(), store.clone(), Duration::from_secs(60))
    }

    fn commit(tenant_id: TenantId, period: NaiveDate) -> RunRequest {
        RunRequest {
            tenant_id,
            dry_run: false,
            period_start: Some(period),
        }
    }

    fn preview(tenant_id: TenantId, period: NaiveDate) -> RunRequest {
        RunRequest {
            dry_run: true,
            ..commit(tenant_id, period)
        }
    }

    async fn seed(
        store: &InMemoryLedgerStore,
        tenant_id: TenantId,
        cost: Money,
        salvage: Money,
        purchased: NaiveDate,
        months: u32,
    ) -> Asset {
        let asset = Asset::new(tenant_id, "laptop", cost, salvage, purchased, months).unwrap();
        store.insert_asset(asset.clone()).await.unwrap();
        asset
    }

    async fn seed_default(store: &InMemoryLedgerStore, tenant_id: TenantId) -> Asset {
        seed(
            store,
            tenant_id,
            Money::new(dec!(1200)),
            Money::ZERO,
            date(2024, 1, 5),
            12,
        )
        .await
    }

    async fn run_ok(runner: &DepreciationRunner, caller: &JwtClaims, req: RunRequest) -> crate::RunReport {
        runner
            .run_with(caller, req, now(), &CancellationToken::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn second_month_follows_first() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        let asset = seed(
            &store,
            tenant,
            Money::new(dec!(120000)),
            Money::ZERO,
            date(2024, 1, 10),
            12,
        )
        .await;
        let runner = runner(&store);

        let jan = run_ok(&runner, &caller, commit(tenant, date(2024, 1, 1))).await;
        assert_eq!(jan.entries_created, 1);
        let feb = run_ok(&runner, &caller, commit(tenant, date(2024, 2, 1))).await;
        assert_eq!(feb.entries_created, 1);
        assert_eq!(feb.status, RunStatus::Success);

        let entries = store.list_entries(tenant, asset.id).await.unwrap();
        let last = entries.last().unwrap();
        assert_eq!(last.period_start, Period::from_ym(2024, 2).unwrap());
        assert_eq!(last.depreciation_amount, Money::new(dec!(10000)));
        assert_eq!(last.accumulated_depreciation, Money::new(dec!(20000)));
        assert_eq!(last.book_value, Money::new(dec!(100000)));

        let stored = store.get_asset(tenant, asset.id).await.unwrap().unwrap();
        assert_eq!(stored.book_value, Money::new(dec!(100000)));
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn asset_stops_at_salvage_value() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        let asset = seed(
            &store,
            tenant,
            Money::new(dec!(5000)),
            Money::new(dec!(500)),
            date(2023, 1, 1),
            10,
        )
        .await;
        let runner = runner(&store);

        let mut period = Period::from_ym(2023, 1).unwrap();
        for _ in 0..10 {
            let report = run_ok(&runner, &caller, commit(tenant, period.start())).await;
            assert_eq!(report.entries_created, 1);
            period = period.next();
        }

        let stored = store.get_asset(tenant, asset.id).await.unwrap().unwrap();
        assert_eq!(stored.accumulated_depreciation, Money::new(dec!(4500)));
        assert_eq!(stored.book_value, Money::new(dec!(500)));

        let eleventh = run_ok(&runner, &caller, commit(tenant, period.start())).await;
        assert_eq!(eleventh.entries_created, 0);
        assert_eq!(eleventh.assets_skipped, 1);
        assert_eq!(eleventh.status, RunStatus::Success);
        assert_eq!(store.entry_count(tenant), 10);
    }

    #[tokio::test]
    async fn rerunning_a_period_creates_nothing() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        seed_default(&store, tenant).await;
        seed_default(&store, tenant).await;
        let runner = runner(&store);

        let first = run_ok(&runner, &caller, commit(tenant, date(2024, 3, 1))).await;
        let second = run_ok(&runner, &caller, commit(tenant, date(2024, 3, 1))).await;

        assert_eq!(first.entries_created, 2);
        assert_eq!(second.entries_created, 0);
        assert_eq!(second.assets_skipped, 2);
        assert_eq!(store.entry_count(tenant), 2);
        assert_eq!(store.list_runs(tenant, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn dry_run_previews_without_writing() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::VIEWER);
        let asset = seed_default(&store, tenant).await;
        let runner = runner(&store);

        let report = run_ok(&runner, &caller, preview(tenant, date(2024, 1, 1))).await;

        assert!(report.run_id.is_none());
        assert_eq!(report.entries_created, 0);
        assert_eq!(report.preview.len(), 1);
        assert_eq!(report.preview[0].asset_id, asset.id);
        assert_eq!(report.preview[0].depreciation_amount, Money::new(dec!(100)));
        assert_eq!(store.entry_count(tenant), 0);
        assert!(store.list_runs(tenant, 10).await.unwrap().is_empty());
        let stored = store.get_asset(tenant, asset.id).await.unwrap().unwrap();
        assert_eq!(stored, asset);
    }

    #[tokio::test]
    async fn viewer_cannot_commit() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        seed_default(&store, tenant).await;
        let runner = runner(&store);

        let err = runner
            .run_with(
                &claims(tenant, Role::VIEWER),
                commit(tenant, date(2024, 1, 1)),
                now(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            RunError::Authorization(AuthzError::Forbidden("depreciation.run".to_string()))
        );
        assert_eq!(store.entry_count(tenant), 0);
    }

    #[tokio::test]
    async fn foreign_tenant_request_is_rejected_without_trace() {
        let store = InMemoryLedgerStore::arc();
        let mine = TenantId::new();
        let theirs = TenantId::new();
        seed_default(&store, theirs).await;
        let runner = runner(&store);

        let err = runner
            .run_with(
                &claims(mine, Role::ADMIN),
                commit(theirs, date(2024, 1, 1)),
                now(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err, RunError::Authorization(AuthzError::TenantMismatch));
        assert_eq!(store.entry_count(theirs), 0);
        assert!(store.list_runs(theirs, 10).await.unwrap().is_empty());
        assert!(store.list_runs(mine, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_periods_are_validation_errors() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        let runner = runner(&store);

        for bad in [date(2024, 2, 14), date(2024, 7, 1)] {
            let err = runner
                .run_with(&caller, commit(tenant, bad), now(), &CancellationToken::new())
                .await
                .unwrap_err();
            assert!(matches!(err, RunError::Validation(_)), "{bad}: {err:?}");
        }
        assert!(store.list_runs(tenant, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn disposed_assets_are_never_depreciated() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        let asset = seed_default(&store, tenant).await;
        let runner = runner(&store);
        let recorder = StatusRecorder::new(store.clone(), Arc::new(ClaimsTenantResolver));

        run_ok(&runner, &caller, commit(tenant, date(2024, 1, 1))).await;
        recorder
            .transition_at(&caller, tenant, asset.id, AssetStatus::Disposed, Some("sold"), now())
            .await
            .unwrap();

        let report = run_ok(&runner, &caller, commit(tenant, date(2024, 2, 1))).await;
        assert_eq!(report.assets_considered, 0);
        assert_eq!(report.entries_created, 0);
        assert_eq!(store.list_entries(tenant, asset.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn tenants_do_not_see_each_other() {
        let store = InMemoryLedgerStore::arc();
        let t1 = TenantId::new();
        let t2 = TenantId::new();
        seed_default(&store, t1).await;
        seed_default(&store, t2).await;
        seed_default(&store, t2).await;
        let runner = runner(&store);

        let r1 = run_ok(&runner, &claims(t1, Role::ADMIN), commit(t1, date(2024, 1, 1))).await;
        assert_eq!(r1.entries_created, 1);
        assert_eq!(store.entry_count(t2), 0);
        assert!(store.list_runs(t2, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_asset_is_a_per_asset_failure() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        seed_default(&store, tenant).await;
        let mut broken = Asset::new(
            tenant,
            "corrupt",
            Money::new(dec!(100)),
            Money::ZERO,
            date(2024, 1, 1),
            10,
        )
        .unwrap();
        broken.useful_life_months = 0;
        store.insert_asset(broken.clone()).await.unwrap();
        let runner = runner(&store);

        let report = run_ok(&runner, &caller, commit(tenant, date(2024, 1, 1))).await;

        assert_eq!(report.status, RunStatus::PartialSuccess);
        assert_eq!(report.entries_created, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].asset_id, broken.id);

        let runs = store.list_runs(tenant, 1).await.unwrap();
        let summary = runs[0].error_summary.as_deref().unwrap();
        assert!(summary.contains(&broken.id.to_string()));
        assert!(matches!(
            report.into_result(),
            Err(RunError::PartialFailure(report)) if report.entries_created == 1
        ));
    }

    /// Store wrapper that injects faults in front of the in-memory ledger.
    struct FaultyStore {
        inner: Arc<InMemoryLedgerStore>,
        fail_listing: bool,
        fail_writes_for: Option<AssetId>,
        conflicts_left: AtomicU32,
        /// Held after listing, so callers keep their snapshot until released.
        after_listing: Option<Arc<Barrier>>,
        write_delay: Option<Duration>,
        writes: AtomicU32,
    }

    impl FaultyStore {
        fn over(inner: &Arc<InMemoryLedgerStore>) -> Self {
            Self {
                inner: inner.clone(),
                fail_listing: false,
                fail_writes_for: None,
                conflicts_left: AtomicU32::new(0),
                after_listing: None,
                write_delay: None,
                writes: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl AssetLedgerStore for FaultyStore {
        async fn list_eligible_assets(&self, tenant_id: TenantId) -> Result<Vec<Asset>, StoreError> {
            if self.fail_listing {
                return Err(StoreError::Unavailable("connection refused".to_string()));
            }
            let assets = self.inner.list_eligible_assets(tenant_id).await?;
            if let Some(barrier) = &self.after_listing {
                barrier.wait().await;
            }
            Ok(assets)
        }

        async fn get_asset(&self, tenant_id: TenantId, asset_id: AssetId) -> Result<Option<Asset>, StoreError> {
            self.inner.get_asset(tenant_id, asset_id).await
        }

        async fn insert_asset(&self, asset: Asset) -> Result<(), StoreError> {
            self.inner.insert_asset(asset).await
        }

        async fn record_depreciation(
            &self,
            entry: DepreciationEntry,
            expected_version: ExpectedVersion,
        ) -> Result<RecordOutcome, StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.write_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_writes_for == Some(entry.asset_id) {
                return Err(StoreError::Unavailable("write timed out".to_string()));
            }
            let injected = self
                .conflicts_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if injected {
                return Err(StoreError::Conflict("injected".to_string()));
            }
            self.inner.record_depreciation(entry, expected_version).await
        }

        async fn list_entries(
            &self,
            tenant_id: TenantId,
            asset_id: AssetId,
        ) -> Result<Vec<DepreciationEntry>, StoreError> {
            self.inner.list_entries(tenant_id, asset_id).await
        }

        async fn record_status_change(
            &self,
            event: AssetEvent,
            expected_version: ExpectedVersion,
        ) -> Result<(), StoreError> {
            self.inner.record_status_change(event, expected_version).await
        }

        async fn list_events(&self, tenant_id: TenantId, asset_id: AssetId) -> Result<Vec<AssetEvent>, StoreError> {
            self.inner.list_events(tenant_id, asset_id).await
        }
    }

    #[tokio::test]
    async fn store_write_failure_does_not_abort_the_run() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        let failing = seed_default(&store, tenant).await;
        seed_default(&store, tenant).await;
        seed_default(&store, tenant).await;
        let faulty = Arc::new(FaultyStore {
            fail_writes_for: Some(failing.id),
            ..FaultyStore::over(&store)
        });
        let runner = runner_over(faulty, store.clone(), Duration::from_secs(60));

        let report = run_ok(&runner, &caller, commit(tenant, date(2024, 1, 1))).await;

        assert_eq!(report.status, RunStatus::PartialSuccess);
        assert_eq!(report.entries_created, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].reason.contains("write timed out"));
        assert_eq!(store.list_entries(tenant, failing.id).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn conflict_is_retried_once_with_a_fresh_snapshot() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        let asset = seed_default(&store, tenant).await;
        let faulty = Arc::new(FaultyStore {
            conflicts_left: AtomicU32::new(1),
            ..FaultyStore::over(&store)
        });
        let runner = runner_over(faulty, store.clone(), Duration::from_secs(60));

        let report = run_ok(&runner, &caller, commit(tenant, date(2024, 1, 1))).await;

        assert_eq!(report.status, RunStatus::Success);
        assert_eq!(report.entries_created, 1);
        assert_eq!(store.list_entries(tenant, asset.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn repeated_conflict_becomes_a_failure() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        seed_default(&store, tenant).await;
        let faulty = Arc::new(FaultyStore {
            conflicts_left: AtomicU32::new(2),
            ..FaultyStore::over(&store)
        });
        let runner = runner_over(faulty, store.clone(), Duration::from_secs(60));

        let report = run_ok(&runner, &caller, commit(tenant, date(2024, 1, 1))).await;

        assert_eq!(report.status, RunStatus::PartialSuccess);
        assert_eq!(report.entries_created, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(store.entry_count(tenant), 0);
    }

    #[tokio::test]
    async fn concurrent_commits_write_each_asset_once() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        for _ in 0..5 {
            seed_default(&store, tenant).await;
        }
        let racing = Arc::new(FaultyStore {
            after_listing: Some(Arc::new(Barrier::new(2))),
            ..FaultyStore::over(&store)
        });
        let a = runner_over(racing.clone(), store.clone(), Duration::from_secs(60));
        let b = runner_over(racing.clone(), store.clone(), Duration::from_secs(60));

        let (cancel_a, cancel_b) = (CancellationToken::new(), CancellationToken::new());
        let (left, right) = tokio::join!(
            a.run_with(&caller, commit(tenant, date(2024, 4, 1)), now(), &cancel_a),
            b.run_with(&caller, commit(tenant, date(2024, 4, 1)), now(), &cancel_b),
        );
        let (left, right) = (left.unwrap(), right.unwrap());

        // Both runs listed before either wrote, so both reached the store.
        assert_eq!(racing.writes.load(Ordering::SeqCst), 10);
        assert_eq!(left.entries_created + right.entries_created, 5);
        assert_eq!(left.assets_skipped + right.assets_skipped, 5);
        assert!(left.failures.is_empty() && right.failures.is_empty());
        assert_eq!(left.status, RunStatus::Success);
        assert_eq!(right.status, RunStatus::Success);
        assert_eq!(store.entry_count(tenant), 5);
        assert_eq!(store.list_runs(tenant, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn status_change_mid_run_is_absorbed_by_the_retry() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        let asset = seed_default(&store, tenant).await;
        let barrier = Arc::new(Barrier::new(2));
        let racing = Arc::new(FaultyStore {
            after_listing: Some(barrier.clone()),
            ..FaultyStore::over(&store)
        });
        let runner = runner_over(racing.clone(), store.clone(), Duration::from_secs(60));
        let recorder = StatusRecorder::new(store.clone(), Arc::new(ClaimsTenantResolver));

        let cancel = CancellationToken::new();
        let (report, _) = tokio::join!(
            runner.run_with(&caller, commit(tenant, date(2024, 1, 1)), now(), &cancel),
            async {
                recorder
                    .transition_at(&caller, tenant, asset.id, AssetStatus::Assigned, None, now())
                    .await
                    .unwrap();
                barrier.wait().await;
            },
        );
        let report = report.unwrap();

        // Stale version on the first write, fresh snapshot on the second.
        assert_eq!(racing.writes.load(Ordering::SeqCst), 2);
        assert_eq!(report.status, RunStatus::Success);
        assert_eq!(report.entries_created, 1);
        let stored = store.get_asset(tenant, asset.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AssetStatus::Assigned);
        assert_eq!(stored.version, 3);
        assert_eq!(stored.book_value, Money::new(dec!(1100)));
    }

    #[tokio::test]
    async fn stalled_write_is_cut_off_at_the_deadline() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        seed_default(&store, tenant).await;
        seed_default(&store, tenant).await;
        let slow = Arc::new(FaultyStore {
            write_delay: Some(Duration::from_secs(30)),
            ..FaultyStore::over(&store)
        });
        let runner = runner_over(slow.clone(), store.clone(), Duration::from_millis(200));

        let started = std::time::Instant::now();
        let report = run_ok(&runner, &caller, commit(tenant, date(2024, 1, 1))).await;

        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(slow.writes.load(Ordering::SeqCst), 1);
        assert_eq!(report.status, RunStatus::PartialSuccess);
        assert_eq!(report.assets_considered, 1);
        assert_eq!(report.entries_created, 0);
        assert!(report.warnings().iter().any(|w| w.contains("timed out")));
        assert_eq!(store.entry_count(tenant), 0);
        let runs = store.list_runs(tenant, 10).await.unwrap();
        assert_eq!(runs[0].status, RunStatus::PartialSuccess);
    }

    #[tokio::test]
    async fn listing_failure_records_a_failed_run() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        seed_default(&store, tenant).await;
        let faulty = Arc::new(FaultyStore {
            fail_listing: true,
            ..FaultyStore::over(&store)
        });
        let runner = runner_over(faulty, store.clone(), Duration::from_secs(60));

        let err = runner
            .run_with(&caller, commit(tenant, date(2024, 1, 1)), now(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Internal(_)));
        let runs = store.list_runs(tenant, 10).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Failed);
        assert_eq!(runs[0].entries_created, 0);
    }

    #[tokio::test]
    async fn cancelled_run_is_partial_and_writes_nothing_further() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        seed_default(&store, tenant).await;
        let runner = runner(&store);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = runner
            .run_with(&caller, commit(tenant, date(2024, 1, 1)), now(), &cancel)
            .await
            .unwrap();

        assert_eq!(report.status, RunStatus::PartialSuccess);
        assert_eq!(report.entries_created, 0);
        assert!(report.interrupted.is_some());
        assert_eq!(store.entry_count(tenant), 0);
        let runs = store.list_runs(tenant, 10).await.unwrap();
        assert_eq!(runs[0].status, RunStatus::PartialSuccess);
    }

    #[tokio::test]
    async fn exhausted_timeout_stops_before_the_first_asset() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        seed_default(&store, tenant).await;
        let runner = runner_over(store.clone(), store.clone(), Duration::ZERO);

        let report = run_ok(&runner, &caller, commit(tenant, date(2024, 1, 1))).await;

        assert_eq!(report.status, RunStatus::PartialSuccess);
        assert_eq!(report.assets_considered, 0);
        assert!(report.warnings().iter().any(|w| w.contains("timed out")));
        assert_eq!(store.entry_count(tenant), 0);
    }

    #[tokio::test]
    async fn recorder_appends_event_and_updates_status() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        let asset = seed_default(&store, tenant).await;
        let recorder = StatusRecorder::new(store.clone(), Arc::new(ClaimsTenantResolver));

        let event = recorder
            .transition_at(&caller, tenant, asset.id, AssetStatus::Assigned, Some("to finance"), now())
            .await
            .unwrap();

        assert_eq!(event.event_type, "asset.status.assigned");
        assert_eq!(event.from_status, AssetStatus::Available);
        assert_eq!(event.performed_by, caller.sub.as_user());
        let stored = store.get_asset(tenant, asset.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AssetStatus::Assigned);
        assert_eq!(store.list_events(tenant, asset.id).await.unwrap(), vec![event]);
    }

    #[tokio::test]
    async fn recorder_rejects_invalid_transitions_without_writing() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let caller = claims(tenant, Role::ACCOUNTANT);
        let asset = seed_default(&store, tenant).await;
        let recorder = StatusRecorder::new(store.clone(), Arc::new(ClaimsTenantResolver));

        recorder
            .transition_at(&caller, tenant, asset.id, AssetStatus::Disposed, None, now())
            .await
            .unwrap();
        let err = recorder
            .transition_at(&caller, tenant, asset.id, AssetStatus::Available, None, now())
            .await
            .unwrap_err();

        assert!(matches!(err, RecorderError::Validation(_)));
        assert_eq!(store.list_events(tenant, asset.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn recorder_checks_scope_and_existence() {
        let store = InMemoryLedgerStore::arc();
        let tenant = TenantId::new();
        let asset = seed_default(&store, tenant).await;
        let recorder = StatusRecorder::new(store.clone(), Arc::new(ClaimsTenantResolver));

        let viewer = recorder
            .transition_at(&claims(tenant, Role::VIEWER), tenant, asset.id, AssetStatus::Lost, None, now())
            .await
            .unwrap_err();
        assert!(matches!(viewer, RecorderError::Authorization(AuthzError::Forbidden(_))));

        let missing = AssetId::new();
        let unknown = recorder
            .transition_at(&claims(tenant, Role::ADMIN), tenant, missing, AssetStatus::Lost, None, now())
            .await
            .unwrap_err();
        assert_eq!(unknown, RecorderError::NotFound(missing));

        let outsider = TenantId::new();
        let foreign = recorder
            .transition_at(&claims(outsider, Role::ADMIN), tenant, asset.id, AssetStatus::Lost, None, now())
            .await
            .unwrap_err();
        assert_eq!(foreign, RecorderError::Authorization(AuthzError::TenantMismatch));
    }
}
