// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Samples gathered during one run, and their rendering in the Prometheus text
//! exposition format.

use prometheus_client::{
    encoding::text::encode,
    metrics::{family::Family, gauge::Gauge},
    registry::Registry,
};
use std::{sync::atomic::AtomicU64, time::Instant};
use strum::IntoEnumIterator as _;

/// Prefix of every exported metric name.
pub const METRICS_PREFIX: &str = "lotus";

/// Label pairs of a sample, in output order.
pub type Labels = Vec<(String, String)>;

/// Builds [`Labels`] from `"name" => value` pairs, any `value: Display`.
#[macro_export]
macro_rules! labels {
    ($($name:literal => $value:expr),* $(,)?) => {
        vec![$(($name.to_string(), $value.to_string())),*]
    };
}

type F64Gauge = Gauge<f64, AtomicU64>;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::IntoStaticStr, strum::EnumIter, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    ScrapeExecutionSucceed,
    ScrapeDurationSeconds,
    ExecutionLocalTime,
    ChainHeight,
    ChainSyncDiff,
    ChainSyncStatus,
    MinerInfo,
    MinerInfoSectorSize,
    DaemonInfo,
    WalletBalance,
    WalletLockedBalance,
    Power,
    PowerMiningEligibility,
    MpoolTotal,
    MpoolLocalTotal,
    MpoolLocalMessage,
    NetpeersTotal,
    NetProtocolIn,
    NetProtocolOut,
    NetTotalIn,
    NetTotalOut,
    NetRateIn,
    NetRateOut,
    MinerWorkerId,
    MinerWorkerCpu,
    MinerWorkerGpu,
    MinerWorkerMemPhysical,
    MinerWorkerMemSwap,
    MinerWorkerMemPhysicalUsed,
    MinerWorkerMemVmemUsed,
    MinerWorkerMemReserved,
    MinerWorkerGpuUsed,
    MinerWorkerCpuUsed,
    MinerWorkerJob,
    MinerSectorState,
    MinerSectorEvent,
    MinerSectorQaPower,
    MinerDeadlineInfo,
    MinerDeadlineActiveStart,
    MinerDeadlineActivePartitions,
    MinerDeadlineActivePartitionsProven,
    MinerDeadlineActiveSectorsAll,
    MinerDeadlineActiveSectorsActive,
    MinerDeadlineActiveSectorsLive,
    MinerDeadlineActiveSectorsFaulty,
    MinerDeadlineActiveSectorsRecovering,
    MinerStorageInfo,
    MinerStorageCapacity,
    MinerStorageAvailable,
    MinerStorageReserved,
    MinerMarketAsk,
    MinerMarketDealInfo,
}

impl Metric {
    pub fn help(self) -> &'static str {
        use Metric::*;
        match self {
            ScrapeExecutionSucceed => {
                "1 if the run succeeded, -1 daemon failure, -2 miner failure, -3 markets failure, 0 other"
            }
            ScrapeDurationSeconds => "execution time of the different collectors",
            ExecutionLocalTime => "time on the node machine when the run started, in unix seconds",
            ChainHeight => "current chain head height",
            ChainSyncDiff => "height difference between sync target and base, per sync worker",
            ChainSyncStatus => "sync stage, per sync worker",
            MinerInfo => "miner information, the value is always 1",
            MinerInfoSectorSize => "sector size of the miner in bytes",
            DaemonInfo => "daemon information, the value is the network version",
            WalletBalance => "wallet balance in FIL",
            WalletLockedBalance => "miner locked funds in FIL",
            Power => "miner and network power in bytes",
            PowerMiningEligibility => "1 if the miner is eligible for mining",
            MpoolTotal => "number of messages pending in the mpool",
            MpoolLocalTotal => "number of pending messages sent from local wallets",
            MpoolLocalMessage => "pending message sent from a local wallet",
            NetpeersTotal => "number of connected peers",
            NetProtocolIn => "bytes received per protocol",
            NetProtocolOut => "bytes sent per protocol",
            NetTotalIn => "total bytes received",
            NetTotalOut => "total bytes sent",
            NetRateIn => "receive rate in bytes per second",
            NetRateOut => "send rate in bytes per second",
            MinerWorkerId => "worker ID, which changes at every restart, the value is always 1",
            MinerWorkerCpu => "number of CPUs of the worker",
            MinerWorkerGpu => "number of GPUs of the worker",
            MinerWorkerMemPhysical => "physical memory of the worker in bytes",
            MinerWorkerMemSwap => "swap of the worker in bytes",
            MinerWorkerMemPhysicalUsed => "minimal memory used by the worker tasks",
            MinerWorkerMemVmemUsed => "maximal memory used by the worker tasks",
            MinerWorkerMemReserved => "memory reserved by lotus on the worker",
            MinerWorkerGpuUsed => "GPU usage of the worker",
            MinerWorkerCpuUsed => "number of CPUs used by the worker tasks",
            MinerWorkerJob => "job running or queued on a worker, the value is its duration",
            MinerSectorState => "sector state, the value is always 1",
            MinerSectorEvent => "timestamp of sector lifecycle events",
            MinerSectorQaPower => "quality adjusted power of the sector in bytes",
            MinerDeadlineInfo => "proving period information, the value is always 1",
            MinerDeadlineActiveStart => "seconds before the deadline opens",
            MinerDeadlineActivePartitions => "number of partitions in the deadline",
            MinerDeadlineActivePartitionsProven => "number of partitions already proven",
            MinerDeadlineActiveSectorsAll => "number of sectors in the deadline",
            MinerDeadlineActiveSectorsActive => "number of active sectors",
            MinerDeadlineActiveSectorsLive => "number of live sectors",
            MinerDeadlineActiveSectorsFaulty => "number of faulty sectors",
            MinerDeadlineActiveSectorsRecovering => "number of recovering sectors",
            MinerStorageInfo => "storage path information, the value is always 1",
            MinerStorageCapacity => "storage path capacity in bytes",
            MinerStorageAvailable => "storage path available space in bytes",
            MinerStorageReserved => "storage path reserved space in bytes",
            MinerMarketAsk => "storage ask of the miner",
            MinerMarketDealInfo => "incomplete storage deal, the value is the piece size",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub metric: Metric,
    pub value: f64,
    pub labels: Labels,
}

/// Samples of one run, plus the checkpoint timer that measures each
/// collection phase.
#[derive(Debug)]
pub struct Metrics {
    samples: Vec<Sample>,
    start: Instant,
    last_checkpoint: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let now = Instant::now();
        let mut metrics = Metrics {
            samples: vec![],
            start: now,
            last_checkpoint: now,
        };
        metrics.add(
            Metric::ExecutionLocalTime,
            chrono::Utc::now().timestamp() as f64,
            vec![],
        );
        metrics
    }

    pub fn add(&mut self, metric: Metric, value: f64, labels: Labels) {
        self.samples.push(Sample {
            metric,
            value,
            labels,
        });
    }

    /// Records the time spent since the previous checkpoint under
    /// `collector`.
    pub fn checkpoint(&mut self, collector: &str) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_checkpoint).as_secs_f64();
        self.last_checkpoint = now;
        tracing::debug!("{collector} collected in {elapsed:.3}s");
        self.add(
            Metric::ScrapeDurationSeconds,
            elapsed,
            crate::labels!("collector" => collector),
        );
    }

    #[cfg(test)]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Closes a successful run: total duration and the success indicator.
    pub fn succeed(&mut self) {
        let elapsed = self.start.elapsed().as_secs_f64();
        self.add(
            Metric::ScrapeDurationSeconds,
            elapsed,
            crate::labels!("collector" => "All"),
        );
        self.add(Metric::ScrapeExecutionSucceed, 1.0, vec![]);
    }

    /// A run that failed: nothing but the indicator.
    pub fn failure(indicator: i8) -> Self {
        let now = Instant::now();
        Metrics {
            samples: vec![Sample {
                metric: Metric::ScrapeExecutionSucceed,
                value: f64::from(indicator),
                labels: vec![],
            }],
            start: now,
            last_checkpoint: now,
        }
    }

    /// Renders all samples. Metrics come out in declaration order, samples of
    /// a metric in insertion order; a repeated label set keeps its last value.
    /// A metric whose samples carry no labels is written without braces.
    pub fn encode(&self) -> anyhow::Result<String> {
        let mut registry = Registry::with_prefix(METRICS_PREFIX);
        for metric in Metric::iter() {
            let samples = self
                .samples
                .iter()
                .filter(|sample| sample.metric == metric)
                .collect::<Vec<_>>();
            let Some(last) = samples.last() else {
                continue;
            };
            let name: &'static str = metric.into();
            if samples.iter().all(|sample| sample.labels.is_empty()) {
                let gauge = F64Gauge::default();
                gauge.set(last.value);
                registry.register(name, metric.help(), gauge);
                continue;
            }
            let family = Family::<Labels, F64Gauge>::default();
            for sample in samples {
                family
                    .get_or_create(&escape_labels(&sample.labels))
                    .set(sample.value);
            }
            registry.register(name, metric.help(), family);
        }
        let mut output = String::new();
        encode(&mut output, &registry)?;
        Ok(output)
    }
}

/// Escapes label values for the text format, which the encoder writes as is.
fn escape_labels(labels: &Labels) -> Labels {
    labels
        .iter()
        .map(|(name, value)| (name.clone(), escape_label_value(value)))
        .collect()
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}
