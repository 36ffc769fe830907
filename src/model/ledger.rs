//! The donation ledger: donations grouped by month.

use crate::model::{Amount, Donation, LedgerError, MonthKey};
use serde::de::{Error as _, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Donations keyed by `MonthKey`.
///
/// Invariants:
/// - exactly one key per (year, month), no matter how many spellings the source file used
/// - no key maps to an empty list
///
/// Entries whose key is not a month are kept as they were read and written back unchanged, so a
/// save never drops data that this program does not understand. They are not part of any total.
///
/// Mutating operations do not modify `self`; they return the updated ledger so that callers can
/// persist it before adopting it.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct DonationLedger {
    months: BTreeMap<MonthKey, Vec<Donation>>,
    unrecognized: BTreeMap<String, Value>,
}

/// The totals for one month of a year, used for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    pub key: MonthKey,
    pub count: usize,
    pub total: Amount,
}

impl DonationLedger {
    /// Returns a ledger with `donation` appended to the list at `key`. The key is created if it
    /// does not exist yet.
    pub fn add_donation(&self, key: MonthKey, donation: Donation) -> Self {
        let mut next = self.clone();
        next.months.entry(key).or_default().push(donation);
        next
    }

    /// Returns a ledger where the donation at `index` under `key` is replaced with `donation`.
    pub fn edit_donation(
        &self,
        key: MonthKey,
        index: usize,
        donation: Donation,
    ) -> Result<Self, LedgerError> {
        let mut next = self.clone();
        let slot = next
            .months
            .get_mut(&key)
            .and_then(|list| list.get_mut(index))
            .ok_or_else(|| out_of_range(key, index))?;
        *slot = donation;
        Ok(next)
    }

    /// Returns a ledger without the donation at `index` under `key`. When that was the last
    /// donation of the month, the key is removed.
    pub fn remove_donation(&self, key: MonthKey, index: usize) -> Result<Self, LedgerError> {
        let mut next = self.clone();
        let list = next
            .months
            .get_mut(&key)
            .filter(|list| index < list.len())
            .ok_or_else(|| out_of_range(key, index))?;
        list.remove(index);
        if list.is_empty() {
            next.months.remove(&key);
        }
        Ok(next)
    }

    /// The donations recorded for `key`, empty if there are none.
    pub fn donations(&self, key: &MonthKey) -> &[Donation] {
        self.months.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// All months in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (&MonthKey, &[Donation])> {
        self.months.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of months that have at least one donation.
    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Keys that were read from the file but are not months.
    pub fn unrecognized_keys(&self) -> impl Iterator<Item = &str> {
        self.unrecognized.keys().map(String::as_str)
    }

    /// Total number of donations across all months.
    pub fn donation_count(&self) -> usize {
        self.months.values().map(Vec::len).sum()
    }

    /// The years present in the ledger, most recent first.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.months.keys().map(MonthKey::year).collect();
        years.dedup();
        years.reverse();
        years
    }

    /// The months of `year` that have donations, in calendar order.
    pub fn months(&self, year: i32) -> Vec<MonthSummary> {
        self.months
            .iter()
            .filter(|(key, _)| key.year() == year)
            .map(|(key, list)| MonthSummary {
                key: *key,
                count: list.len(),
                total: list.iter().map(Donation::amount).sum(),
            })
            .collect()
    }

    pub fn month_total(&self, key: &MonthKey) -> Amount {
        self.donations(key).iter().map(Donation::amount).sum()
    }

    /// Sum of every donation made in `year`.
    pub fn year_total(&self, year: i32) -> Amount {
        self.months
            .iter()
            .filter(|(key, _)| key.year() == year)
            .flat_map(|(_, list)| list.iter().map(Donation::amount))
            .sum()
    }

    /// Sum of `year_total` over every year in the ledger.
    pub fn grand_total(&self) -> Amount {
        self.years().into_iter().map(|y| self.year_total(y)).sum()
    }
}

fn out_of_range(key: MonthKey, index: usize) -> LedgerError {
    LedgerError::IndexOutOfRange {
        collection: key.to_string(),
        index,
    }
}

impl Serialize for DonationLedger {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.months.len() + self.unrecognized.len()))?;
        for (key, list) in &self.months {
            map.serialize_entry(&key.to_string(), list)?;
        }
        for (key, value) in &self.unrecognized {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DonationLedger {
    /// Reads `{"<year>-<month>": [...]}` and merges every spelling of the same month into one
    /// key, keeping donations in document order. Empty lists are dropped. Keys that are not months
    /// are set aside as they are.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(LedgerVisitor)
    }
}

struct LedgerVisitor;

impl<'de> Visitor<'de> for LedgerVisitor {
    type Value = DonationLedger;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of \"<year>-<month>\" keys to lists of donations")
    }

    fn visit_map<A>(self, mut access: A) -> Result<DonationLedger, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut months: BTreeMap<MonthKey, Vec<Donation>> = BTreeMap::new();
        let mut unrecognized = BTreeMap::new();
        while let Some((raw_key, value)) = access.next_entry::<String, Value>()? {
            let key = match MonthKey::from_str(&raw_key) {
                Ok(key) => key,
                Err(e) => {
                    warn!("{e}, keeping its entry as it is");
                    unrecognized.insert(raw_key, value);
                    continue;
                }
            };
            let list = Vec::<Donation>::deserialize(value)
                .map_err(|e| A::Error::custom(format!("{raw_key}: {e}")))?;
            if list.is_empty() {
                continue;
            }
            months.entry(key).or_default().extend(list);
        }
        Ok(DonationLedger {
            months,
            unrecognized,
        })
    }
}
