/// CSV export of year traces, SOC matrices, and search scans.
pub mod export;
