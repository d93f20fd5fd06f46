//! Renders cluster reports into a single-sheet xlsx workbook.
//!
//! Each cluster becomes three stacked tables (cluster, node groups, add-ons), each followed by a blank row. The sheet
//! is first laid out as plain rows so that the layout can be inspected without parsing xlsx output.
use crate::error::{self, Result};
use models::inventory::ClusterReport;

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use snafu::ResultExt;

const CLUSTER_HEADERS: [&str; 5] = ["Cluster Name", "Version", "VPC", "Region", "Status"];
const NODEGROUP_HEADERS: [&str; 5] = [
    "NodeGroup Name",
    "Version",
    "Node Instance Type",
    "AMI Type",
    "GPU Node",
];
const ADDON_HEADERS: [&str; 5] = [
    "AddOn Name",
    "Version",
    "Status",
    "Service Account",
    "AddOn Pods",
];

const CLUSTER_HEADER_FILL: u32 = 0xFFA500;
const COLUMN_PADDING: usize = 2;
const COLUMN_WIDTH_SCALE: f64 = 1.2;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Cell {
    Text(String),
    Flag(bool),
}

impl Cell {
    fn text<S: Into<String>>(value: S) -> Self {
        Cell::Text(value.into())
    }

    /// Length of the longest line, as a spreadsheet application would display the cell.
    fn display_width(&self) -> usize {
        match self {
            Cell::Text(text) => text
                .lines()
                .map(|line| line.chars().count())
                .max()
                .unwrap_or(0),
            Cell::Flag(true) => "TRUE".len(),
            Cell::Flag(false) => "FALSE".len(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RowKind {
    /// Header of the cluster table, highlighted with the fill color.
    ClusterHeader,
    Header,
    Data,
    /// Add-on rows, whose pod column holds one pod name per line.
    WrappedData,
    Blank,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SheetRow {
    pub kind: RowKind,
    pub cells: Vec<Cell>,
}

impl SheetRow {
    fn headers(kind: RowKind, headers: &[&str]) -> Self {
        SheetRow {
            kind,
            cells: headers.iter().map(|header| Cell::text(*header)).collect(),
        }
    }

    fn blank() -> Self {
        SheetRow {
            kind: RowKind::Blank,
            cells: Vec::new(),
        }
    }
}

/// Lays out every report as rows, in order.
pub fn sheet_rows(reports: &[ClusterReport]) -> Vec<SheetRow> {
    let mut rows = Vec::new();

    for report in reports {
        let details = &report.details;
        rows.push(SheetRow::headers(RowKind::ClusterHeader, &CLUSTER_HEADERS));
        rows.push(SheetRow {
            kind: RowKind::Data,
            cells: vec![
                Cell::text(&details.name),
                Cell::text(&details.version),
                Cell::text(&details.vpc_id),
                Cell::text(&details.region),
                Cell::text(&details.status),
            ],
        });
        rows.push(SheetRow::blank());

        rows.push(SheetRow::headers(RowKind::Header, &NODEGROUP_HEADERS));
        rows.extend(report.node_groups.iter().map(|nodegroup| SheetRow {
            kind: RowKind::Data,
            cells: vec![
                Cell::text(&nodegroup.name),
                Cell::text(&nodegroup.release_version),
                Cell::text(nodegroup.instance_types.join(", ")),
                Cell::text(&nodegroup.ami_type),
                Cell::Flag(nodegroup.gpu),
            ],
        }));
        rows.push(SheetRow::blank());

        rows.push(SheetRow::headers(RowKind::Header, &ADDON_HEADERS));
        rows.extend(report.addons.iter().map(|addon| SheetRow {
            kind: RowKind::WrappedData,
            cells: vec![
                Cell::text(addon.name()),
                Cell::text(addon.version()),
                Cell::text(addon.status()),
                Cell::text(addon.service_account().unwrap_or_default()),
                Cell::text(addon.pods().join("\n")),
            ],
        }));
        rows.push(SheetRow::blank());
    }

    rows
}

/// Column widths sized to the longest line seen anywhere in each column.
pub fn column_widths(rows: &[SheetRow]) -> Vec<f64> {
    let mut longest: Vec<usize> = Vec::new();
    for row in rows {
        for (column, cell) in row.cells.iter().enumerate() {
            if longest.len() <= column {
                longest.resize(column + 1, 0);
            }
            longest[column] = longest[column].max(cell.display_width());
        }
    }

    longest
        .into_iter()
        .map(|width| (width + COLUMN_PADDING) as f64 * COLUMN_WIDTH_SCALE)
        .collect()
}

struct RowFormats {
    cluster_header: Format,
    header: Format,
    data: Format,
    wrapped: Format,
}

impl RowFormats {
    fn new() -> Self {
        let data = Format::new()
            .set_align(FormatAlign::Left)
            .set_border(FormatBorder::Thin);
        let header = data.clone().set_bold();
        RowFormats {
            cluster_header: header
                .clone()
                .set_background_color(Color::RGB(CLUSTER_HEADER_FILL)),
            header,
            wrapped: data
                .clone()
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap(),
            data,
        }
    }

    fn for_kind(&self, kind: RowKind) -> &Format {
        match kind {
            RowKind::ClusterHeader => &self.cluster_header,
            RowKind::Header => &self.header,
            RowKind::WrappedData => &self.wrapped,
            RowKind::Data | RowKind::Blank => &self.data,
        }
    }
}

/// Serializes the reports into xlsx bytes. An empty slice still produces a valid, empty workbook.
pub fn render_workbook(reports: &[ClusterReport]) -> Result<Vec<u8>> {
    let rows = sheet_rows(reports);
    let formats = RowFormats::new();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_screen_gridlines(false);

    for (row_index, row) in rows.iter().enumerate() {
        let row_number = row_index as u32;
        let format = formats.for_kind(row.kind);
        for (column_index, cell) in row.cells.iter().enumerate() {
            let column = column_index as u16;
            let written = match cell {
                Cell::Text(text) => {
                    worksheet.write_string_with_format(row_number, column, text.as_str(), format)
                }
                Cell::Flag(flag) => {
                    worksheet.write_boolean_with_format(row_number, column, *flag, format)
                }
            };
            written.context(error::WriteCellSnafu {
                item: format!("row {} column {}", row_index + 1, column_index + 1),
            })?;
        }
    }

    for (column_index, width) in column_widths(&rows).into_iter().enumerate() {
        worksheet
            .set_column_width(column_index as u16, width)
            .context(error::WriteCellSnafu {
                item: format!("width of column {}", column_index + 1),
            })?;
    }

    workbook.save_to_buffer().context(error::SaveWorkbookSnafu)
}

#[cfg(test)]
mod test {
    use super::*;
    use models::cluster::ClusterDetails;
    use models::eks::{ManagedAddon, NodeGroupInfo};
    use models::inventory::{AddonInfo, TrackedDeployment};

    fn fake_report(name: &str, node_groups: usize, addons: usize) -> ClusterReport {
        ClusterReport {
            details: ClusterDetails {
                name: name.to_string(),
                region: "us-east-1".to_string(),
                version: "1.29".to_string(),
                status: "ACTIVE".to_string(),
                vpc_id: "vpc-0abc".to_string(),
                ..Default::default()
            },
            node_groups: (0..node_groups)
                .map(|index| {
                    NodeGroupInfo::new(
                        format!("ng-{}", index),
                        vec!["g5.xlarge".to_string(), "m5.large".to_string()],
                        "AL2_x86_64_GPU".to_string(),
                        "1.29.0-20240227".to_string(),
                    )
                })
                .collect(),
            addons: (0..addons)
                .map(|index| {
                    AddonInfo::Managed(ManagedAddon {
                        name: format!("addon-{}", index),
                        version: "v1.0.0-eksbuild.1".to_string(),
                        status: "ACTIVE".to_string(),
                        service_account: None,
                    })
                })
                .collect(),
        }
    }

    #[test]
    fn test_row_counts() {
        let mut test_cases = vec![
            (vec![], 0),
            (vec![fake_report("empty", 0, 0)], 7),
            (vec![fake_report("demo", 2, 3)], 12),
            (vec![fake_report("a", 1, 1), fake_report("b", 0, 4)], 9 + 11),
        ];

        for (reports, expected) in test_cases.drain(..) {
            assert_eq!(sheet_rows(&reports).len(), expected);
        }
    }

    #[test]
    fn test_cluster_layout() {
        let mut report = fake_report("demo", 1, 0);
        report.addons.push(AddonInfo::TrackedDeployment(TrackedDeployment {
            name: "aws-load-balancer-controller".to_string(),
            available_replicas: 1,
            replicas: 2,
            service_account: Some("aws-load-balancer-controller".to_string()),
            pods: vec!["alb-1".to_string(), "alb-2".to_string()],
        }));
        let rows = sheet_rows(&[report]);

        let kinds: Vec<RowKind> = rows.iter().map(|row| row.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RowKind::ClusterHeader,
                RowKind::Data,
                RowKind::Blank,
                RowKind::Header,
                RowKind::Data,
                RowKind::Blank,
                RowKind::Header,
                RowKind::WrappedData,
                RowKind::Blank,
            ]
        );

        assert_eq!(rows[0].cells[0], Cell::text("Cluster Name"));
        assert_eq!(
            rows[1].cells,
            vec![
                Cell::text("demo"),
                Cell::text("1.29"),
                Cell::text("vpc-0abc"),
                Cell::text("us-east-1"),
                Cell::text("ACTIVE"),
            ]
        );
        assert_eq!(rows[4].cells[2], Cell::text("g5.xlarge, m5.large"));
        assert_eq!(rows[4].cells[4], Cell::Flag(true));
        assert_eq!(
            rows[7].cells,
            vec![
                Cell::text("aws-load-balancer-controller"),
                Cell::text(""),
                Cell::text("Available: 1/2"),
                Cell::text("aws-load-balancer-controller"),
                Cell::text("alb-1\nalb-2"),
            ]
        );
    }

    #[test]
    fn test_column_widths_use_longest_line() {
        let rows = vec![
            SheetRow {
                kind: RowKind::Header,
                cells: vec![Cell::text("Name"), Cell::text("AddOn Pods")],
            },
            SheetRow::blank(),
            SheetRow {
                kind: RowKind::WrappedData,
                cells: vec![
                    Cell::Flag(false),
                    Cell::text("pod-a\na-much-longer-pod-name"),
                ],
            },
        ];

        let widths = column_widths(&rows);

        assert_eq!(widths.len(), 2);
        assert!((widths[0] - (5.0 + 2.0) * 1.2).abs() < 1e-9);
        assert!((widths[1] - (22.0 + 2.0) * 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_render_produces_xlsx() {
        let bytes = render_workbook(&[fake_report("demo", 1, 1)]).unwrap();
        // xlsx files are zip archives.
        assert_eq!(&bytes[..2], b"PK");

        let empty = render_workbook(&[]).unwrap();
        assert_eq!(&empty[..2], b"PK");
    }
}
