// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]

use chrono::{Duration, TimeZone, Utc};

use bluecarbon::core::compliance::query::{
    acknowledge_alert, list_active_alerts, list_records, overview, overview_of, project_detail, summarize,
};
use bluecarbon::core::compliance::ComplianceError;
use bluecarbon::core::fixtures::FixtureGenerator;
use bluecarbon::core::state::repository::{ComplianceRepository, InMemoryRepository, RecordFilter};
use bluecarbon::core::types::{
    Alert, AlertSeverity, AlertStatus, AlertType, ComplianceRecord, ComplianceStatus, RiskLevel,
};

fn fixture_repo(seed: u64) -> (InMemoryRepository, Vec<ComplianceRecord>) {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let generator = FixtureGenerator::new(seed, now);
    let records = generator.records(60);
    let repo = InMemoryRepository::new();
    for r in &records {
        repo.put_record(r).unwrap();
    }
    for a in generator.alerts(12, 60) {
        repo.put_alert(&a).unwrap();
    }
    (repo, records)
}

#[test]
fn status_filter_returns_only_matching_records_with_matching_summary() {
    let (repo, all) = fixture_repo(11);

    let listing = list_records(&repo, &RecordFilter::status("Frozen")).unwrap();
    assert!(listing
        .compliance_records
        .iter()
        .all(|r| r.compliance_status == ComplianceStatus::Frozen));

    let expected: Vec<ComplianceRecord> = all
        .iter()
        .filter(|r| r.compliance_status == ComplianceStatus::Frozen)
        .cloned()
        .collect();
    assert_eq!(listing.compliance_records.len(), expected.len());
    assert_eq!(listing.summary.total_projects, expected.len());
    assert_eq!(listing.summary.frozen_credits, expected.len());
    assert_eq!(listing.summary.revoked_credits, 0);
    assert_eq!(listing.summary.compliant_projects, 0);
}

#[test]
fn combined_filters_and_all_sentinel() {
    let (repo, all) = fixture_repo(12);

    let unfiltered = list_records(&repo, &RecordFilter::from_query(Some("all"), Some(""), None)).unwrap();
    assert_eq!(unfiltered.compliance_records.len(), all.len());
    let ids: Vec<&str> = unfiltered.compliance_records.iter().map(|r| r.project_id.as_str()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);

    let filter = RecordFilter::from_query(Some("Compliant"), Some("Low"), Some("company-2"));
    let listing = list_records(&repo, &filter).unwrap();
    for r in &listing.compliance_records {
        assert_eq!(r.compliance_status, ComplianceStatus::Compliant);
        assert_eq!(r.risk_level, RiskLevel::Low);
        assert_eq!(r.company_id, "company-2");
    }
    assert_eq!(listing.summary, summarize(&listing.compliance_records));
}

#[test]
fn summary_counts_revoked_as_frozen_too() {
    let (_, all) = fixture_repo(13);
    let s = summarize(&all);
    let revoked = all.iter().filter(|r| r.credits_revoked).count();
    let frozen_or_revoked = all
        .iter()
        .filter(|r| matches!(r.compliance_status, ComplianceStatus::Frozen | ComplianceStatus::Revoked))
        .count();
    assert_eq!(s.revoked_credits, revoked);
    assert_eq!(s.frozen_credits, frozen_or_revoked);
    assert_eq!(s.total_projects, all.len());
}

#[test]
fn acknowledging_twice_keeps_first_timestamp() {
    let repo = InMemoryRepository::new();
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
    repo.put_alert(&Alert::new(
        "alert-1".into(),
        "PRJ-0001".into(),
        AlertType::Co2SignificantDrop,
        AlertSeverity::High,
        t0,
    ))
    .unwrap();

    let first = acknowledge_alert(&repo, "alert-1", t0 + Duration::hours(1)).unwrap();
    assert_eq!(first.alert_status, AlertStatus::Acknowledged);
    assert_eq!(first.acknowledged_at, Some(t0 + Duration::hours(1)));

    let second = acknowledge_alert(&repo, "alert-1", t0 + Duration::hours(5)).unwrap();
    assert_eq!(second.acknowledged_at, first.acknowledged_at);
    assert!(list_active_alerts(&repo).unwrap().is_empty());

    assert!(matches!(
        acknowledge_alert(&repo, "alert-404", t0),
        Err(ComplianceError::NotFound(_))
    ));
}

#[test]
fn active_alerts_are_newest_first() {
    let repo = InMemoryRepository::new();
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    for (i, hours) in [(1, 3), (2, 9), (3, 1)] {
        repo.put_alert(&Alert::new(
            format!("alert-{i}"),
            "PRJ-0001".into(),
            AlertType::NdviThresholdBreach,
            AlertSeverity::Medium,
            t0 + Duration::hours(hours),
        ))
        .unwrap();
    }
    let ids: Vec<String> = list_active_alerts(&repo).unwrap().into_iter().map(|a| a.alert_id).collect();
    assert_eq!(ids, vec!["alert-2", "alert-1", "alert-3"]);
}

#[test]
fn overview_of_empty_store_is_zero() {
    let repo = InMemoryRepository::new();
    let o = overview(&repo).unwrap();
    assert_eq!(o.total_monitored_projects, 0);
    assert_eq!(o.compliance_rate, 0.0);
    assert_eq!(o.average_compliance_score, 0.0);
    assert_eq!(o.projects_at_risk, 0);
    assert_eq!(o.recent_degradations, 0);
}

#[test]
fn overview_figures() {
    let (_, mut records) = fixture_repo(14);
    records.truncate(4);
    let statuses = [
        ComplianceStatus::Compliant,
        ComplianceStatus::Compliant,
        ComplianceStatus::ReviewNeeded,
        ComplianceStatus::NonCompliant,
    ];
    let risks = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High, RiskLevel::Critical];
    let scores = [0.9, 0.8, 0.7, 0.6];
    let changes = [(-11.0, 0.0), (0.0, -15.0), (0.0, -15.01), (5.0, 5.0)];
    for (i, r) in records.iter_mut().enumerate() {
        r.compliance_status = statuses[i];
        r.credits_frozen = false;
        r.credits_revoked = false;
        r.risk_level = risks[i];
        r.compliance_score = scores[i];
        r.ndvi_change_percent = changes[i].0;
        r.co2_change_percent = changes[i].1;
    }

    let o = overview_of(&records);
    assert_eq!(o.total_monitored_projects, 4);
    assert_eq!(o.compliance_rate, 50.0);
    assert_eq!(o.average_compliance_score, 0.75);
    assert_eq!(o.projects_at_risk, 2);
    assert_eq!(o.recent_degradations, 2);
}

#[test]
fn project_detail_of_unknown_project_is_not_found() {
    let (repo, _) = fixture_repo(15);
    assert!(matches!(project_detail(&repo, "PRJ-9999"), Err(ComplianceError::NotFound(_))));
    let d = project_detail(&repo, "PRJ-0001").unwrap();
    assert_eq!(d.compliance_record.project_id, "PRJ-0001");
    assert!(d.audit_log.is_empty());
}
