//! レコードストアモジュール
//!
//! インポートしたラベル一覧に対する階層クエリを提供する。
//! フィルタに一致するレコードから次のフィールドの値を出現順で集計し、
//! 各グループの検証済み件数を数える。読み取り専用。

use crate::types::{Filter, LabelRecord, Level};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// 一覧の1グループ（あるレベルの値ひとつ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub value: String,
    pub validated: usize,
    pub total: usize,
}

impl GroupSummary {
    /// 全件検証済みか（空グループは未完了）
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.validated == self.total
    }

    /// バッジ表示 "validated/total"
    pub fn badge(&self) -> String {
        format!("{}/{}", self.validated, self.total)
    }
}

/// フッターの集計（現在のグループではなく全レコード）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FooterSummary {
    pub validated: usize,
    pub total: usize,
}

impl fmt::Display for FooterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} validadas", self.validated, self.total)
    }
}

/// あるレベルで表示する一覧
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Listing {
    /// Routes〜Referencesのグループ一覧
    Groups { level: Level, groups: Vec<GroupSummary> },
    /// 全フィールド確定後のラベル一覧（インポート順）
    Labels(Vec<LabelRecord>),
}

impl Listing {
    pub fn level(&self) -> Level {
        match self {
            Listing::Groups { level, .. } => *level,
            Listing::Labels(_) => Level::Labels,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Listing::Groups { groups, .. } => groups.len(),
            Listing::Labels(labels) => labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// レコード列への読み取りビュー
#[derive(Debug, Clone, Copy)]
pub struct RecordStore<'a> {
    records: &'a [LabelRecord],
}

impl<'a> RecordStore<'a> {
    pub fn new(records: &'a [LabelRecord]) -> Self {
        Self { records }
    }

    /// フィルタに一致するレコード（インポート順）
    pub fn matching_records(&self, filter: &Filter) -> Vec<&'a LabelRecord> {
        self.records.iter().filter(|r| filter.matches(r)).collect()
    }

    /// 次の未設定フィールドの値一覧（空文字除外、出現順、重複なし）
    pub fn distinct_values(&self, filter: &Filter) -> Vec<&'a str> {
        let Some(field) = filter.next_field() else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| filter.matches(r))
            .map(|r| r.field(field))
            .filter(|v| !v.is_empty() && seen.insert(*v))
            .collect()
    }

    /// 次のフィールドでグループ化した件数集計
    pub fn group_summaries(&self, filter: &Filter) -> Vec<GroupSummary> {
        let Some(field) = filter.next_field() else {
            return Vec::new();
        };

        let mut groups: Vec<GroupSummary> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for record in self.records.iter().filter(|r| filter.matches(r)) {
            let value = record.field(field);
            if value.is_empty() {
                continue;
            }

            let slot = *index.entry(value).or_insert_with(|| {
                groups.push(GroupSummary {
                    value: value.to_string(),
                    validated: 0,
                    total: 0,
                });
                groups.len() - 1
            });

            let group = &mut groups[slot];
            group.total += 1;
            if record.validated {
                group.validated += 1;
            }
        }

        groups
    }

    /// フィルタの深さに応じた一覧
    pub fn listing(&self, filter: &Filter) -> Listing {
        match filter.level() {
            Level::Labels => Listing::Labels(
                self.matching_records(filter).into_iter().cloned().collect(),
            ),
            level => Listing::Groups {
                level,
                groups: self.group_summaries(filter),
            },
        }
    }

    /// 全体の検証済み件数
    pub fn footer_summary(&self) -> FooterSummary {
        FooterSummary {
            validated: self.records.iter().filter(|r| r.validated).count(),
            total: self.records.len(),
        }
    }

    /// コード完全一致の最初のレコード
    pub fn find_by_code(&self, code: &str) -> Option<&'a LabelRecord> {
        self.records.iter().find(|r| r.code == code)
    }

    /// コードを大文字小文字無視で検索（スキャン用）
    pub fn find_by_code_ignore_case(&self, code: &str) -> Option<&'a LabelRecord> {
        let needle = code.to_uppercase();
        self.records.iter().find(|r| r.code.to_uppercase() == needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(code: &str, route: &str, city: &str, dest: &str, reference: &str) -> LabelRecord {
        LabelRecord {
            reference: reference.into(),
            code: code.into(),
            destination: dest.into(),
            city: city.into(),
            route: route.into(),
            validated: false,
        }
    }

    fn sample() -> Vec<LabelRecord> {
        vec![
            label("A1", "R1", "C1", "D1", "Ref1"),
            label("A2", "R1", "C1", "D1", "Ref1"),
            label("B1", "R2", "C2", "D2", "Ref2"),
        ]
    }

    #[test]
    fn test_routes_in_first_seen_order() {
        let mut records = sample();
        records.insert(0, label("Z9", "R9", "C9", "D9", "Ref9"));
        let store = RecordStore::new(&records);
        assert_eq!(store.distinct_values(&Filter::default()), vec!["R9", "R1", "R2"]);
    }

    #[test]
    fn test_root_listing_scenario() {
        let records = sample();
        let store = RecordStore::new(&records);
        let groups = store.group_summaries(&Filter::default());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], GroupSummary { value: "R1".into(), validated: 0, total: 2 });
        assert_eq!(groups[1], GroupSummary { value: "R2".into(), validated: 0, total: 1 });
        assert!(groups.iter().all(|g| !g.is_complete()));
    }

    #[test]
    fn test_route_groups_partition_records() {
        let records = vec![
            label("1", "R1", "C1", "D1", "X"),
            label("2", "R2", "C1", "D1", "X"),
            label("3", "R1", "C2", "D1", "X"),
            label("4", "R3", "C1", "D2", "Y"),
            label("5", "R2", "C3", "D1", "X"),
        ];
        let store = RecordStore::new(&records);
        let groups = store.group_summaries(&Filter::default());

        let sum: usize = groups.iter().map(|g| g.total).sum();
        assert_eq!(sum, records.len());
        for record in &records {
            assert_eq!(groups.iter().filter(|g| g.value == record.route).count(), 1);
        }
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let records = vec![
            label("1", "", "C1", "D1", "X"),
            label("2", "R1", "", "D1", "X"),
        ];
        let store = RecordStore::new(&records);
        assert_eq!(store.distinct_values(&Filter::default()), vec!["R1"]);

        let f = Filter::default().extended("R1").unwrap();
        assert!(store.distinct_values(&f).is_empty());
    }

    #[test]
    fn test_completion_badge() {
        let mut records = sample();
        records[0].validated = true;
        let store = RecordStore::new(&records);
        let groups = store.group_summaries(&Filter::default());
        assert_eq!(groups[0].badge(), "1/2");
        assert!(!groups[0].is_complete());

        records[1].validated = true;
        let store = RecordStore::new(&records);
        let groups = store.group_summaries(&Filter::default());
        assert_eq!(groups[0].badge(), "2/2");
        assert!(groups[0].is_complete());
    }

    #[test]
    fn test_empty_group_is_not_complete() {
        let g = GroupSummary { value: "R".into(), validated: 0, total: 0 };
        assert!(!g.is_complete());
    }

    #[test]
    fn test_labels_listing_keeps_import_order() {
        let records = sample();
        let store = RecordStore::new(&records);
        let filter = Filter::default()
            .extended("R1").unwrap()
            .extended("C1").unwrap()
            .extended("D1").unwrap()
            .extended("Ref1").unwrap();

        match store.listing(&filter) {
            Listing::Labels(labels) => {
                let codes: Vec<_> = labels.iter().map(|l| l.code.as_str()).collect();
                assert_eq!(codes, vec!["A1", "A2"]);
            }
            other => panic!("unexpected listing: {:?}", other),
        }
    }

    #[test]
    fn test_nested_levels() {
        let records = sample();
        let store = RecordStore::new(&records);
        let f = Filter::default().extended("R1").unwrap();
        let listing = store.listing(&f);
        assert_eq!(listing.level(), Level::Cities);
        assert_eq!(listing.len(), 1);
    }

    #[test]
    fn test_footer_counts_all_records() {
        let mut records = sample();
        records[2].validated = true;
        let footer = RecordStore::new(&records).footer_summary();
        assert_eq!(footer, FooterSummary { validated: 1, total: 3 });
        assert_eq!(footer.to_string(), "1 / 3 validadas");
    }

    #[test]
    fn test_find_by_code_first_match() {
        let mut records = sample();
        let mut dup = label("A1", "R7", "C7", "D7", "Ref7");
        dup.validated = true;
        records.push(dup);
        let store = RecordStore::new(&records);

        assert_eq!(store.find_by_code("A1").unwrap().route, "R1");
        assert!(store.find_by_code("a1").is_none());
        assert_eq!(store.find_by_code_ignore_case("a1").unwrap().route, "R1");
        assert!(store.find_by_code_ignore_case("ZZ").is_none());
    }
}
