use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::{VoucherFilter, VoucherService};
use crate::domain::Voucher;

/// Full dump of the voucher table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub vouchers: Vec<Voucher>,
}

/// Exporter for writing vouchers out in various formats
pub struct Exporter<'a> {
    service: &'a VoucherService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a VoucherService) -> Self {
        Self { service }
    }

    /// Export vouchers to CSV format
    pub async fn export_vouchers_csv<W: Write>(
        &self,
        writer: W,
        filter: VoucherFilter,
    ) -> Result<usize> {
        let vouchers = self.service.list_vouchers(filter).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "code", "discount", "used", "created_at", "used_at"])?;

        for voucher in &vouchers {
            csv_writer.write_record(&[
                voucher.id.to_string(),
                voucher.code.clone(),
                voucher.discount.to_string(),
                voucher.used.to_string(),
                voucher.created_at.to_rfc3339(),
                voucher
                    .used_at
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_default(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(vouchers.len())
    }

    /// Export vouchers as a JSON snapshot
    pub async fn export_vouchers_json<W: Write>(
        &self,
        mut writer: W,
        filter: VoucherFilter,
    ) -> Result<usize> {
        let vouchers = self.service.list_vouchers(filter).await?;
        let count = vouchers.len();

        let snapshot = VoucherSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            vouchers,
        };

        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writeln!(writer)?;
        Ok(count)
    }
}
