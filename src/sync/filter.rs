use crate::config::TrackedAccounts;
use crate::simplefin::AccountRecord;

/// True when the account's display name (exact, case-sensitive) or its
/// provider ID is listed in `tracked`.
pub fn is_tracked(account: &AccountRecord, tracked: &TrackedAccounts) -> bool {
    tracked.names.iter().any(|name| name == account.name())
        || tracked.ids.iter().any(|id| id == account.id().as_str())
}

/// Keep only tracked accounts, preserving input order.
pub fn filter_tracked<'a>(
    accounts: &'a [AccountRecord],
    tracked: &TrackedAccounts,
) -> Vec<&'a AccountRecord> {
    accounts
        .iter()
        .filter(|account| is_tracked(account, tracked))
        .collect()
}

/// Tracked names and IDs that matched nothing in the payload.
///
/// A name showing up here usually means the provider renamed the account.
pub fn unmatched_tracked(accounts: &[AccountRecord], tracked: &TrackedAccounts) -> Vec<String> {
    let names = tracked
        .names
        .iter()
        .filter(|name| !accounts.iter().any(|a| a.name() == name.as_str()));
    let ids = tracked
        .ids
        .iter()
        .filter(|id| !accounts.iter().any(|a| a.id().as_str() == id.as_str()));
    names.chain(ids).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountDetails, Id};

    fn record(id: &str, name: &str) -> AccountRecord {
        AccountRecord {
            details: AccountDetails {
                id: Id::from(id),
                name: name.to_string(),
                currency: "USD".to_string(),
                balance: "0".to_string(),
                available_balance: None,
                balance_date: 0,
            },
            transactions: Vec::new(),
        }
    }

    fn ids(filtered: &[&AccountRecord]) -> Vec<String> {
        filtered.iter().map(|a| a.id().to_string()).collect()
    }

    #[test]
    fn keeps_exact_name_matches_in_input_order() {
        let accounts = vec![
            record("a", "Mortgage"),
            record("b", "Brokerage"),
            record("c", "One Deposit Checking"),
            record("d", "Chase Sapphire Preferred"),
        ];
        // Tracked order differs from input order on purpose.
        let tracked = TrackedAccounts::from_names(["One Deposit Checking", "Mortgage"]);

        assert_eq!(ids(&filter_tracked(&accounts, &tracked)), vec!["a", "c"]);
    }

    #[test]
    fn name_match_is_case_sensitive() {
        let accounts = vec![record("a", "checking"), record("b", "Checking")];
        let tracked = TrackedAccounts::from_names(["Checking"]);

        assert_eq!(ids(&filter_tracked(&accounts, &tracked)), vec!["b"]);
    }

    #[test]
    fn empty_tracked_set_keeps_nothing() {
        let accounts = vec![record("a", "Checking")];
        assert!(filter_tracked(&accounts, &TrackedAccounts::default()).is_empty());
    }

    #[test]
    fn tracked_ids_survive_renames() {
        let accounts = vec![record("ACT-1", "Renamed Checking"), record("ACT-2", "Savings")];
        let tracked = TrackedAccounts::from_names(["Checking"]).with_ids(["ACT-1"]);

        assert_eq!(ids(&filter_tracked(&accounts, &tracked)), vec!["ACT-1"]);
        assert_eq!(unmatched_tracked(&accounts, &tracked), vec!["Checking".to_string()]);
    }

    #[test]
    fn duplicate_names_are_all_kept() {
        let accounts = vec![record("a", "Checking"), record("b", "Checking")];
        let tracked = TrackedAccounts::from_names(["Checking"]);
        assert_eq!(filter_tracked(&accounts, &tracked).len(), 2);
    }

    #[test]
    fn filter_is_exactly_the_name_membership_subset() {
        let names = ["A", "B", "C", "D", "E"];
        let accounts: Vec<AccountRecord> = names
            .iter()
            .enumerate()
            .map(|(i, n)| record(&format!("id-{i}"), n))
            .collect();

        // Every subset of the names as tracked set.
        for mask in 0u32..(1 << names.len()) {
            let tracked_names: Vec<&str> = names
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << *i) != 0)
                .map(|(_, n)| *n)
                .collect();
            let tracked = TrackedAccounts::from_names(tracked_names.clone());

            let expected: Vec<&AccountRecord> = accounts
                .iter()
                .filter(|a| tracked_names.contains(&a.name()))
                .collect();
            assert_eq!(filter_tracked(&accounts, &tracked), expected);
        }
    }
}
