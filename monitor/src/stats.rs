/// Process-wide counters. Only ever grow; a restart starts from zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub total_scans: u64,
    pub total_alerts_sent: u64,
    pub last_alert_symbol: Option<String>,
    pub last_alert_rsi: Option<f64>,
}

impl RunStats {
    pub fn record_scan(&mut self) {
        self.total_scans += 1;
    }

    pub fn record_alert(&mut self, symbol: &str, rsi: f64) {
        self.total_alerts_sent += 1;
        self.last_alert_symbol = Some(symbol.to_string());
        self.last_alert_rsi = Some(rsi);
    }
}
