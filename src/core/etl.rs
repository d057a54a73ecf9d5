use crate::core::report::RunReport;
use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
        }
    }

    /// Run one batch end to end. Directory and archive failures abort the
    /// run; per-file and per-row problems end up in the report.
    pub async fn run(&self) -> Result<RunReport> {
        let mut phases = Vec::with_capacity(4);
        tracing::info!("Starting routing run");

        // 目錄快照：整個執行期間唯讀
        let directory = self.pipeline.snapshot().await?;
        phases.push(self.monitor.mark("directory"));

        let ingested = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Extracted {} rows from {} files ({} failed)",
            ingested.records.len(),
            ingested.files_read,
            ingested.failures.len()
        );
        phases.push(self.monitor.mark("extract"));

        let routed = self.pipeline.transform(&directory, ingested).await?;
        tracing::info!("🔄 Routed rows into {} agent files", routed.bundle.files.len());
        phases.push(self.monitor.mark("transform"));

        let mut report = self.pipeline.load(routed).await?;
        phases.push(self.monitor.mark("load"));

        self.monitor.log_final_stats();
        report.phases = phases;
        Ok(report)
    }
}
