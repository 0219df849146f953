use std::collections::BTreeMap;

use rsv_reconcile::*;

fn acct(tag: u8) -> AccountId {
    let mut b = [0u8; 20];
    b[19] = tag;
    AccountId::from_bytes(b)
}

fn source(category: ObligationCategory, rows: &[(AccountId, Amount)]) -> ObligationSource {
    ObligationSource::from_records(
        category,
        rows.iter().map(|(a, v)| ObligationRecord::new(*a, *v)),
    )
    .unwrap()
}

fn actual(rows: &[(AccountId, Amount)]) -> ActualReservedIndex {
    ActualReservedIndex::from_records(
        rows.iter()
            .map(|(a, v)| ActualReservedRecord::new(*a, *v)),
    )
}

#[test]
fn scenario_excess_from_staking_is_releasable_without_escalation() {
    let a = acct(0xA);
    let set = ObligationSet::from_sources(vec![
        source(ObligationCategory::CandidateBond, &[(a, 40)]),
        source(ObligationCategory::DelegatorTotal, &[(a, 30)]),
    ])
    .unwrap();

    let r = reconcile(&set, &actual(&[(a, 100)])).unwrap();

    assert_eq!(r.discrepancies.len(), 1);
    let d = &r.discrepancies[0];
    assert_eq!(d.account, a);
    assert_eq!(d.actual, 100);
    assert_eq!(d.expected, 70);
    assert_eq!(d.delta.to_string(), "+30");
    assert_eq!(d.kind(), DiscrepancyKind::Excess);
    assert_eq!(
        d.expected_by_category,
        BTreeMap::from([
            (ObligationCategory::CandidateBond, 40),
            (ObligationCategory::DelegatorTotal, 30),
        ])
    );
    assert!(!r.requires_corrective_transaction);
}

#[test]
fn scenario_proxy_plus_treasury_deficit_escalates() {
    let a = acct(0xA);
    let set = ObligationSet::from_sources(vec![
        source(ObligationCategory::Proxy, &[(a, 20)]),
        source(ObligationCategory::Treasury, &[(a, 40)]),
    ])
    .unwrap();

    let r = reconcile(&set, &actual(&[(a, 50)])).unwrap();

    assert_eq!(r.discrepancies.len(), 1);
    let d = &r.discrepancies[0];
    assert_eq!((d.actual, d.expected), (50, 60));
    assert_eq!(d.delta.to_string(), "-10");
    assert_eq!(d.kind(), DiscrepancyKind::Deficit);
    assert!(r.requires_corrective_transaction);
}

#[test]
fn scenario_obligation_without_balance_record_is_a_deficit() {
    let b = acct(0xB);
    let set = ObligationSet::from_sources(vec![
        source(ObligationCategory::AuthorMapping, &[(b, 5)]),
    ])
    .unwrap();

    let r = reconcile(&set, &ActualReservedIndex::default()).unwrap();

    assert_eq!(r.discrepancies.len(), 1);
    let d = &r.discrepancies[0];
    assert_eq!(d.account, b);
    assert_eq!((d.actual, d.expected), (0, 5));
    assert_eq!(d.delta.to_string(), "-5");
    assert!(r.requires_corrective_transaction);
}

#[test]
fn scenario_consistent_account_never_reported() {
    let c = acct(0xC);
    let set = ObligationSet::from_sources(vec![
        source(ObligationCategory::CandidateBond, &[(c, 10)]),
        source(ObligationCategory::Proxy, &[(c, 5)]),
        source(ObligationCategory::AuthorMapping, &[(c, 1)]),
    ])
    .unwrap();

    let r = reconcile(&set, &actual(&[(c, 16)])).unwrap();

    assert!(r.is_consistent());
    assert_eq!(r.accounts_considered, 1);
    assert!(!r.requires_corrective_transaction);
    assert_eq!(plan_remediation(&r), Remediation::Consistent);
}
