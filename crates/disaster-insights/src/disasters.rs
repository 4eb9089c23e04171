//! EM-DAT column vocabulary and the analyses built on it.
//!
//! The generic aggregators accept any column names; the helpers here wire
//! them to the columns of a public EM-DAT export.

use crate::aggregate::{Aggregation, TableFilter, conditional_frequency, grouped_summary};
use crate::error::Result;
use crate::types::Category;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const DISASTER_NUMBER: &str = "DisNo.";
pub const DISASTER_GROUP: &str = "Disaster Group";
pub const DISASTER_SUBGROUP: &str = "Disaster Subgroup";
pub const DISASTER_TYPE: &str = "Disaster Type";
pub const START_YEAR: &str = "Start Year";
pub const START_MONTH: &str = "Start Month";
pub const END_YEAR: &str = "End Year";
pub const REGION: &str = "Region";
pub const ISO: &str = "ISO";
pub const OFDA_BHA_RESPONSE: &str = "OFDA/BHA Response";
pub const APPEAL: &str = "Appeal";
pub const DECLARATION: &str = "Declaration";

/// Column added by [`impact_summary`].
pub const IMPACT_SCORE: &str = "Impact Score";

/// Yes/No OFDA/BHA response counts for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionResponse {
    pub region: Category,
    pub yes: usize,
    pub no: usize,
}

/// Regions of events that received the given OFDA/BHA `response`.
pub fn response_by_region(df: &DataFrame, response: &str) -> Result<crate::FrequencyTable> {
    conditional_frequency(df, OFDA_BHA_RESPONSE, &Category::text(response), REGION)
}

/// "Yes" and "No" response counts side by side for every region that has
/// either, ordered by region.
pub fn response_split(df: &DataFrame) -> Result<Vec<RegionResponse>> {
    let yes = response_by_region(df, "Yes")?;
    let no = response_by_region(df, "No")?;

    let mut regions: Vec<Category> = yes
        .iter()
        .chain(no.iter())
        .map(|(region, _)| region.clone())
        .collect();
    regions.sort();
    regions.dedup();

    Ok(regions
        .into_iter()
        .map(|region| RegionResponse {
            yes: yes.get(&region).unwrap_or(0),
            no: no.get(&region).unwrap_or(0),
            region,
        })
        .collect())
}

/// Dashboard sidebar selection: optional year range plus region and
/// disaster-group multi-selects. Empty lists mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSelection {
    pub years: Option<(i64, i64)>,
    pub regions: Vec<String>,
    pub disaster_groups: Vec<String>,
}

impl DashboardSelection {
    pub fn to_filter(&self) -> TableFilter {
        let mut filter = TableFilter::new();
        if let Some((min, max)) = self.years {
            filter = filter.between(START_YEAR, min, max);
        }
        if !self.regions.is_empty() {
            filter = filter.one_of(REGION, self.regions.iter().map(String::as_str));
        }
        if !self.disaster_groups.is_empty() {
            filter = filter.one_of(DISASTER_GROUP, self.disaster_groups.iter().map(String::as_str));
        }
        filter
    }

    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        self.to_filter().apply(df)
    }
}

/// Per (disaster group, start month, region) occurrence summary.
///
/// Reports the number of events with a disaster number, first start year, last end year, how many
/// events had an OFDA/BHA response, an appeal and a declaration recorded,
/// and an impact score summing those three.
pub fn impact_summary(df: &DataFrame) -> Result<DataFrame> {
    let summary = grouped_summary(
        df,
        &[DISASTER_GROUP, START_MONTH, REGION],
        &[
            Aggregation::present(DISASTER_NUMBER, "Count"),
            Aggregation::min(START_YEAR, "First Occurrence"),
            Aggregation::max(END_YEAR, "Last Occurrence"),
            Aggregation::present(OFDA_BHA_RESPONSE, "OFDA Responses"),
            Aggregation::present(APPEAL, "Appeals"),
            Aggregation::present(DECLARATION, "Declarations"),
        ],
    )?;

    let scored = summary
        .lazy()
        .with_column(
            (col("OFDA Responses").cast(DataType::Int64)
                + col("Appeals").cast(DataType::Int64)
                + col("Declarations").cast(DataType::Int64))
            .alias(IMPACT_SCORE),
        )
        .collect()?;

    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::utils::column_categories;
    use pretty_assertions::assert_eq;

    fn events() -> DataFrame {
        df!(
            DISASTER_NUMBER => &[Some("2001-0001-IND"), Some("1998-0042-IND"), Some("2005-0007-NGA"), Some("2010-0300-CHN")],
            DISASTER_GROUP => &["Natural", "Natural", "Natural", "Technological"],
            START_MONTH => &[Some(7i64), Some(7), Some(1), Some(7)],
            REGION => &["Asia", "Asia", "Africa", "Asia"],
            START_YEAR => &[2001i64, 1998, 2005, 2010],
            END_YEAR => &[2001i64, 1999, 2006, 2010],
            OFDA_BHA_RESPONSE => &[Some("Yes"), Some("No"), None, Some("Yes")],
            APPEAL => &[Some("Yes"), None, None, None],
            DECLARATION => &[Some("Yes"), Some("Yes"), None, None],
        )
        .unwrap()
    }

    #[test]
    fn test_response_by_region() {
        let yes = response_by_region(&events(), "Yes").unwrap();
        assert_eq!(yes.count_of("Asia"), 2);
        assert_eq!(yes.total(), 2);
    }

    #[test]
    fn test_response_split() {
        let split = response_split(&events()).unwrap();
        assert_eq!(
            split,
            vec![RegionResponse {
                region: Category::text("Asia"),
                yes: 2,
                no: 1
            }]
        );
    }

    #[test]
    fn test_dashboard_selection() {
        let selection = DashboardSelection {
            years: Some((2000, 2010)),
            regions: vec!["Asia".to_string()],
            disaster_groups: vec![],
        };
        let filtered = selection.apply(&events()).unwrap();
        assert_eq!(filtered.height(), 2);
        assert!(DashboardSelection::default().to_filter().is_empty());
    }

    #[test]
    fn test_impact_summary() {
        let summary = impact_summary(&events()).unwrap();
        assert_eq!(summary.height(), 3);
        assert_eq!(
            column_categories(&summary, "Count").unwrap(),
            vec![Category::Int(2), Category::Int(1), Category::Int(1)]
        );
        assert_eq!(
            column_categories(&summary, "First Occurrence").unwrap()[0],
            Category::Int(1998)
        );
        assert_eq!(
            column_categories(&summary, IMPACT_SCORE).unwrap(),
            vec![Category::Int(5), Category::Int(0), Category::Int(1)]
        );
    }

    #[test]
    fn test_impact_count_skips_missing_disaster_number() {
        let mut df = events();
        df.replace(
            DISASTER_NUMBER,
            Series::new(
                DISASTER_NUMBER.into(),
                &[Some("2001-0001-IND"), None, Some("2005-0007-NGA"), Some("2010-0300-CHN")],
            ),
        )
        .unwrap();

        let summary = impact_summary(&df).unwrap();
        assert_eq!(
            column_categories(&summary, "Count").unwrap(),
            vec![Category::Int(1), Category::Int(1), Category::Int(1)]
        );
        assert_eq!(
            column_categories(&summary, "First Occurrence").unwrap()[0],
            Category::Int(1998)
        );
    }

    #[test]
    fn test_impact_summary_needs_vocabulary() {
        let df = df!("Region" => &["Asia"]).unwrap();
        assert!(matches!(
            impact_summary(&df),
            Err(AnalysisError::ColumnNotFound(_))
        ));
    }
}
