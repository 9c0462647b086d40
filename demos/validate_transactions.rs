//! Fraud ring forensics example
//!
//! Builds a small in-memory transaction batch containing a circular
//! routing pattern and a fan-in smurfing pattern, then prints the
//! resulting forensic report.

use fraud_ring_forensics::{analyze, AnalysisConfig, Transaction};

fn tx(id: &str, sender: &str, receiver: &str, amount: f64, timestamp: &str) -> Transaction {
    Transaction {
        transaction_id: id.to_string(),
        sender_id: sender.to_string(),
        receiver_id: receiver.to_string(),
        amount,
        timestamp: timestamp.to_string(),
    }
}

fn main() {
    println!("=== Fraud Ring Forensics ===\n");

    let mut transactions = vec![
        tx("T1", "ACCT-A", "ACCT-B", 10_000.0, "2024-01-01 09:00:00"),
        tx("T2", "ACCT-B", "ACCT-C", 9_800.0, "2024-01-01 10:00:00"),
        tx("T3", "ACCT-C", "ACCT-A", 9_600.0, "2024-01-01 11:00:00"),
    ];

    for i in 0..12 {
        transactions.push(tx(
            &format!("T-FANIN-{i}"),
            &format!("ACCT-SENDER-{i}"),
            "ACCT-HUB",
            250.0,
            &format!("2024-01-02 {:02}:00:00", i % 24),
        ));
    }

    let report = analyze(&transactions, &AnalysisConfig::default())
        .expect("analysis should succeed on well-formed input");

    println!("Accounts analyzed: {}", report.summary.total_accounts_analyzed);
    println!("Transactions submitted: {}", report.summary.total_transactions);
    println!("Processing time: {:.2}s\n", report.summary.processing_time_seconds);

    println!("Fraud rings detected: {}", report.fraud_rings.len());
    for ring in &report.fraud_rings {
        println!(
            "  {} — members {:?}, risk {:.1}, pattern {:?}",
            ring.ring_id, ring.member_accounts, ring.risk_score, ring.pattern
        );
    }

    println!("\nSuspicious accounts: {}", report.suspicious_accounts.len());
    for account in &report.suspicious_accounts {
        println!(
            "  {} — score {:.1}, tags {:?}, ring {:?}",
            account.account_id, account.suspicion_score, account.detected_patterns, account.ring_id
        );
    }

    println!(
        "\nGraph projection: {}/{} nodes rendered (filtered: {})",
        report.graph_data.rendered_nodes, report.graph_data.total_nodes, report.graph_data.is_filtered
    );
}
