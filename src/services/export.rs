//! # 기록부 내보내기 (xlsx)
//!
//! 기록부 하나를 인쇄용 문서로 바꿉니다. 두 단계로 나뉩니다.
//!
//! 1. `LogbookReport::build`: 표시용 문자열로 바꾸기 (월 이름, 검증 표시, 페이지 나누기)
//! 2. `render_xlsx`: A4 가로 워크시트로 그리기 (머리글 행 반복, 쪽 번호 바닥글)
//!
//! 첫 단계는 순수 함수라서 워크북 없이 테스트할 수 있습니다.

use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::{
    error::AppError,
    models::{ClassSession, Logbook, User},
    services::verification,
    storage::Storage,
};

pub const REPORT_TITLE: &str = "LIBRO DE TEMAS";
pub const ROWS_PER_PAGE: usize = 15;

const MONTHS: [&str; 12] = [
    "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio", "Julio", "Agosto", "Septiembre",
    "Octubre", "Noviembre", "Diciembre",
];

const HEADERS: [&str; 9] = [
    "Día",
    "Mes",
    "Clase N°",
    "Carácter",
    "Contenido",
    "Tarea a Realizar",
    "Verif.\nProfesor",
    "Observaciones",
    "Verif.\nDirector",
];

const COLUMN_WIDTHS: [f64; 9] = [6.0, 12.0, 8.0, 14.0, 32.0, 28.0, 9.0, 26.0, 13.0];

pub const SIGNATURES: [&str; 2] = ["Firma del Profesor", "Firma del Director"];

pub fn month_name(month: u32) -> String {
    month
        .checked_sub(1)
        .and_then(|i| MONTHS.get(i as usize))
        .map(|m| m.to_string())
        .unwrap_or_else(|| month.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub day: String,
    pub month: String,
    pub class_number: String,
    pub class_character: String,
    pub content: String,
    pub task: String,
    pub teacher_verification: String,
    pub observations: String,
    pub director_verification: String,
}

impl ReportRow {
    fn from_session(session: &ClassSession) -> Self {
        let observations = session.observations.trim();
        Self {
            day: session.day.to_string(),
            month: month_name(session.month),
            class_number: session.class_number.to_string(),
            class_character: session.class_character.to_string(),
            content: session.content.clone(),
            task: session.task.clone(),
            teacher_verification: if session.teacher_verification { "✓✓" } else { "" }.to_string(),
            observations: if observations.is_empty() { "-" } else { observations }.to_string(),
            director_verification: if session.is_director_verified() {
                "✓ Verificado"
            } else {
                "Pendiente"
            }
            .to_string(),
        }
    }

    pub fn cells(&self) -> [&str; 9] {
        [
            &self.day,
            &self.month,
            &self.class_number,
            &self.class_character,
            &self.content,
            &self.task,
            &self.teacher_verification,
            &self.observations,
            &self.director_verification,
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogbookReport {
    pub title: String,
    pub subtitle: String,
    pub teacher_name: String,
    /// dd/mm/yyyy
    pub generated_on: String,
    pub year: i32,
    pub total_classes: String,
    pub teacher_verified: String,
    pub rows: Vec<ReportRow>,
}

impl LogbookReport {
    pub fn build(
        logbook: &Logbook,
        teacher_name: &str,
        subject_name: &str,
        course_name: &str,
        generated_on: NaiveDate,
    ) -> Self {
        let total = logbook.sessions.len();
        Self {
            title: REPORT_TITLE.to_string(),
            subtitle: format!("{} - {}", subject_name, course_name),
            teacher_name: teacher_name.to_string(),
            generated_on: generated_on.format("%d/%m/%Y").to_string(),
            year: generated_on.year(),
            total_classes: format!("{} {}", total, if total == 1 { "clase" } else { "clases" }),
            teacher_verified: format!("{} de {}", logbook.teacher_verified_count(), total),
            rows: logbook.sessions.iter().map(ReportRow::from_session).collect(),
        }
    }

    /// 한 쪽에 `ROWS_PER_PAGE`개씩 나눈 행 묶음. 빈 기록부도 한 쪽입니다.
    pub fn pages(&self) -> Vec<&[ReportRow]> {
        if self.rows.is_empty() {
            return vec![&[]];
        }
        self.rows.chunks(ROWS_PER_PAGE).collect()
    }
}

/// `LibroTemas_<과목>_<과정>_<연도>.xlsx`
///
/// 연속된 공백은 `_` 하나로 바꾸고 `[A-Za-z0-9_.-]` 밖의 문자는 지웁니다.
pub fn export_file_name(subject_name: &str, course_name: &str, year: i32) -> String {
    let raw = format!("LibroTemas_{}_{}_{}.xlsx", subject_name, course_name, year);
    let mut name = String::with_capacity(raw.len());
    let mut in_space = false;
    for c in raw.chars() {
        if c.is_whitespace() {
            if !in_space {
                name.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
            name.push(c);
        }
    }
    name
}

// 워크시트 레이아웃의 행 번호
const TITLE_ROW: u32 = 0;
const SUBTITLE_ROW: u32 = 1;
const TEACHER_ROW: u32 = 3;
const TOTALS_ROW: u32 = 4;
const HEADER_ROW: u32 = 6;
const LAST_COL: u16 = 8;

pub fn render_xlsx(report: &LogbookReport) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    write_sheet(worksheet, report).map_err(|e| AppError::Export(e.to_string()))?;
    workbook
        .save_to_buffer()
        .map_err(|e| AppError::Export(e.to_string()))
}

fn write_sheet(worksheet: &mut Worksheet, report: &LogbookReport) -> Result<(), XlsxError> {
    let title = Format::new()
        .set_bold()
        .set_font_size(18)
        .set_align(FormatAlign::Center);
    let subtitle = Format::new()
        .set_bold()
        .set_font_size(14)
        .set_align(FormatAlign::Center);
    let label = Format::new().set_bold();
    let header = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x428BCA))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Thin);
    let centered = Format::new()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Thin);
    let text = Format::new()
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Thin);
    let shaded_centered = centered.clone().set_background_color(Color::RGB(0xF5F5F5));
    let shaded_text = text.clone().set_background_color(Color::RGB(0xF5F5F5));

    worksheet.set_name("Libro de Temas")?;
    worksheet.set_landscape();
    worksheet.set_paper_size(9);
    worksheet.set_print_fit_to_pages(1, 0);
    worksheet.set_footer("&CPágina &P de &N");
    worksheet.set_repeat_rows(HEADER_ROW, HEADER_ROW)?;
    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }

    worksheet.merge_range(TITLE_ROW, 0, TITLE_ROW, LAST_COL, &report.title, &title)?;
    worksheet.merge_range(SUBTITLE_ROW, 0, SUBTITLE_ROW, LAST_COL, &report.subtitle, &subtitle)?;

    worksheet.write_string_with_format(TEACHER_ROW, 0, "Profesor/a:", &label)?;
    worksheet.write_string(TEACHER_ROW, 2, &report.teacher_name)?;
    worksheet.write_string_with_format(TEACHER_ROW, 6, "Fecha de generación:", &label)?;
    worksheet.write_string(TEACHER_ROW, 8, &report.generated_on)?;
    worksheet.write_string_with_format(TOTALS_ROW, 0, "Total de clases:", &label)?;
    worksheet.write_string(TOTALS_ROW, 2, &report.total_classes)?;
    worksheet.write_string_with_format(TOTALS_ROW, 6, "Verificadas por profesor:", &label)?;
    worksheet.write_string(TOTALS_ROW, 8, &report.teacher_verified)?;

    worksheet.set_row_height(HEADER_ROW, 30)?;
    for (col, name) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(HEADER_ROW, col as u16, *name, &header)?;
    }

    let mut row = HEADER_ROW + 1;
    let mut breaks = Vec::new();
    for (page_index, page) in report.pages().into_iter().enumerate() {
        if page_index > 0 {
            breaks.push(row);
        }
        for (i, entry) in page.iter().enumerate() {
            let shaded = i % 2 == 1;
            for (col, value) in entry.cells().into_iter().enumerate() {
                let wide = matches!(col, 4 | 5 | 7);
                let format = match (wide, shaded) {
                    (true, false) => &text,
                    (true, true) => &shaded_text,
                    (false, false) => &centered,
                    (false, true) => &shaded_centered,
                };
                worksheet.write_string_with_format(row, col as u16, value, format)?;
            }
            row += 1;
        }
    }
    if !breaks.is_empty() {
        worksheet.set_page_breaks(&breaks)?;
    }

    let signature_row = row + 3;
    let line = "______________________";
    for (col, caption) in [(1u16, SIGNATURES[0]), (7u16, SIGNATURES[1])] {
        worksheet.write_string(signature_row, col, line)?;
        worksheet.write_string(signature_row + 1, col, caption)?;
        worksheet.write_string(signature_row + 2, col, "Fecha: ___/___/_____")?;
    }

    Ok(())
}

/// 내보내기 파일
#[derive(Debug)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// 기록부를 읽고 권한을 확인한 뒤 xlsx 파일을 만듭니다.
pub async fn export_logbook(
    storage: &dyn Storage,
    requester: &User,
    logbook_id: &str,
    today: NaiveDate,
) -> Result<ExportedFile, AppError> {
    let logbook = verification::load_logbook(storage, logbook_id).await?;
    verification::ensure_can_view(&logbook, requester)?;

    let (teacher, subjects, courses) = tokio::try_join!(
        storage.get_user(&logbook.teacher_id),
        storage.get_subjects(),
        storage.get_courses(),
    )?;
    let teacher_name = teacher.map(|t| t.name).unwrap_or_default();
    let subject_name = subjects
        .into_iter()
        .find(|s| s.id == logbook.subject_id)
        .map(|s| s.name)
        .unwrap_or_default();
    let course_name = courses
        .into_iter()
        .find(|c| c.id == logbook.course_id)
        .map(|c| c.name)
        .unwrap_or_default();

    let report = LogbookReport::build(&logbook, &teacher_name, &subject_name, &course_name, today);
    let bytes = render_xlsx(&report)?;
    tracing::info!(logbook_id, size = bytes.len(), "logbook exported");

    Ok(ExportedFile {
        file_name: export_file_name(&subject_name, &course_name, report.year),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassCharacter, DirectorVerification};

    fn session(n: u32, month: u32, teacher: bool, director: bool, observations: &str) -> ClassSession {
        ClassSession {
            id: format!("s{}", n),
            day: 10,
            month,
            class_number: n,
            class_character: ClassCharacter::Practica,
            content: "Fracciones".into(),
            task: "Ejercicios 1-10".into(),
            teacher_verification: teacher,
            observations: observations.into(),
            director_verification: director.then(|| DirectorVerification {
                verified: true,
                director_name: "Directora".into(),
                signature: Some("Directora".into()),
                verified_at: Some("2026-03-11T10:00:00.000Z".into()),
            }),
            created_at: String::new(),
        }
    }

    fn logbook(sessions: Vec<ClassSession>) -> Logbook {
        let mut logbook = Logbook::new("t1", "s1", "c1");
        logbook.sessions = sessions;
        logbook
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()
    }

    #[test]
    fn rows_use_spanish_labels_and_indicators() {
        let report = LogbookReport::build(
            &logbook(vec![session(1, 3, true, true, ""), session(2, 4, false, false, "Feriado")]),
            "Ana Pérez",
            "Matemática",
            "1° 2ª - Mañana",
            today(),
        );

        assert_eq!(report.title, "LIBRO DE TEMAS");
        assert_eq!(report.subtitle, "Matemática - 1° 2ª - Mañana");
        assert_eq!(report.generated_on, "05/03/2026");
        assert_eq!(report.total_classes, "2 clases");
        assert_eq!(report.teacher_verified, "1 de 2");

        let first = &report.rows[0];
        assert_eq!(first.month, "Marzo");
        assert_eq!(first.class_character, "Práctica");
        assert_eq!(first.teacher_verification, "✓✓");
        assert_eq!(first.observations, "-");
        assert_eq!(first.director_verification, "✓ Verificado");

        let second = &report.rows[1];
        assert_eq!(second.month, "Abril");
        assert_eq!(second.teacher_verification, "");
        assert_eq!(second.observations, "Feriado");
        assert_eq!(second.director_verification, "Pendiente");
    }

    #[test]
    fn single_class_uses_singular_label() {
        let report = LogbookReport::build(
            &logbook(vec![session(1, 3, false, false, "")]),
            "Ana",
            "Física",
            "2° 1ª - Tarde",
            today(),
        );
        assert_eq!(report.total_classes, "1 clase");
    }

    #[test]
    fn rows_are_split_into_pages() {
        let sessions = (1..=ROWS_PER_PAGE as u32 + 1)
            .map(|n| session(n, 5, false, false, ""))
            .collect();
        let report = LogbookReport::build(&logbook(sessions), "Ana", "Física", "2°", today());
        let pages = report.pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].len(), ROWS_PER_PAGE);
        assert_eq!(pages[1].len(), 1);

        let empty = LogbookReport::build(&logbook(Vec::new()), "Ana", "Física", "2°", today());
        assert_eq!(empty.pages().len(), 1);
    }

    #[test]
    fn out_of_range_month_falls_back_to_number() {
        assert_eq!(month_name(12), "Diciembre");
        assert_eq!(month_name(13), "13");
        assert_eq!(month_name(0), "0");
    }

    #[test]
    fn file_name_is_sanitized() {
        assert_eq!(
            export_file_name("Matemática  Aplicada", "1° 2ª - Mañana", 2026),
            "LibroTemas_Matemtica_Aplicada_1_2_-_Maana_2026.xlsx"
        );
    }

    #[test]
    fn workbook_renders_to_xlsx_bytes() {
        let sessions = (1..=20).map(|n| session(n, 6, n % 2 == 0, false, "")).collect();
        let report = LogbookReport::build(&logbook(sessions), "Ana", "Química", "4° 1ª - Tarde", today());
        let bytes = render_xlsx(&report).unwrap();
        // xlsx는 zip 컨테이너
        assert_eq!(&bytes[..2], b"PK");
    }
}
