// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Scrape, UNKNOWN};
use crate::labels;
use crate::metrics::Metric;
use crate::rpc_client::{
    LotusError,
    types::{SchedDiag, WorkerJob, WorkerStats},
};
use ahash::HashMap;
use chrono::DateTime;
use itertools::Itertools as _;
use serde_json::json;

/// `RunWait` of requests still in the scheduler queue.
const QUEUED_RUN_WAIT: i64 = 99;

impl Scrape<'_> {
    pub(super) async fn workers(&mut self) -> Result<(), LotusError> {
        let stats = self
            .nodes
            .miner
            .call::<Option<HashMap<String, WorkerStats>>>("WorkerStats", json!([]))
            .await?
            .unwrap_or_default();

        for (id, worker) in stats.into_iter().sorted_by(|a, b| a.0.cmp(&b.0)) {
            let resources = &worker.info.resources;
            let labels = labels!("miner_id" => self.miner_id, "worker_host" => worker.info.hostname);
            // IDs change at every worker restart, hostnames don't
            self.metrics.add(
                Metric::MinerWorkerId,
                1.0,
                labels!(
                    "miner_id" => self.miner_id,
                    "worker_host" => worker.info.hostname,
                    "worker_id" => id,
                ),
            );
            for (metric, value) in [
                (Metric::MinerWorkerCpu, resources.cpus as f64),
                (Metric::MinerWorkerGpu, resources.gpus.len() as f64),
                (Metric::MinerWorkerMemPhysical, resources.mem_physical as f64),
                (Metric::MinerWorkerMemSwap, resources.mem_swap as f64),
                (Metric::MinerWorkerMemReserved, resources.mem_reserved as f64),
                (Metric::MinerWorkerMemPhysicalUsed, worker.mem_used_min as f64),
                (Metric::MinerWorkerMemVmemUsed, worker.mem_used_max as f64),
                (Metric::MinerWorkerGpuUsed, worker.gpu_used.as_f64()),
                (Metric::MinerWorkerCpuUsed, worker.cpu_use as f64),
            ] {
                self.metrics.add(metric, value, labels.clone());
            }
            self.workers.insert(id, worker.info.hostname);
        }
        self.metrics.checkpoint("Workers");
        Ok(())
    }

    /// Running jobs, valued with how long they have been running.
    pub(super) async fn jobs(&mut self) -> Result<(), LotusError> {
        let jobs = self
            .nodes
            .miner
            .call::<Option<HashMap<String, Vec<WorkerJob>>>>("WorkerJobs", json!([]))
            .await?
            .unwrap_or_default();

        for (worker_id, jobs) in jobs.into_iter().sorted_by(|a, b| a.0.cmp(&b.0)) {
            // WorkerJobs sometimes reports a zeroed ID
            let worker = self.workers.get(&worker_id).map_or_else(
                || {
                    tracing::debug!("jobs of unknown worker {worker_id}");
                    UNKNOWN
                },
                String::as_str,
            );
            for job in jobs {
                let running_for = match DateTime::parse_from_rfc3339(&job.start) {
                    Ok(start) => (self.started_at - start.to_utc()).num_milliseconds() as f64 / 1e3,
                    Err(e) => {
                        tracing::debug!("couldn't parse start time of job {}: {e}", job.job_id());
                        0.0
                    }
                };
                self.metrics.add(
                    Metric::MinerWorkerJob,
                    running_for,
                    labels!(
                        "miner_id" => self.miner_id,
                        "job_id" => job.job_id(),
                        "worker_host" => worker,
                        "task" => job.task,
                        "sector_id" => job.sector.number,
                        "start" => job.start,
                        "run_wait" => job.run_wait,
                    ),
                );
            }
        }
        self.metrics.checkpoint("Jobs");
        Ok(())
    }

    /// Requests waiting for a worker, as jobs with no worker.
    pub(super) async fn sched_diag(&mut self) -> Result<(), LotusError> {
        let diag: SchedDiag = self
            .nodes
            .miner
            .call("SealingSchedDiag", json!([false]))
            .await?;
        for request in diag.requests {
            self.metrics.add(
                Metric::MinerWorkerJob,
                0.0,
                labels!(
                    "miner_id" => self.miner_id,
                    "job_id" => "",
                    "worker_host" => "",
                    "task" => request.task_type,
                    "sector_id" => request.sector.number,
                    "start" => "",
                    "run_wait" => QUEUED_RUN_WAIT,
                ),
            );
        }
        self.metrics.checkpoint("SchedDiag");
        Ok(())
    }
}
