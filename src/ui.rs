use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use crate::domain::PromptMode;
use crate::model::{Model, UIData};

pub const TITLE_HEIGHT: usize = 1;
pub const FILTERS_PER_ROW: usize = 3;
pub const TABLE_CHROME_HEIGHT: usize = 3; // Two borders and the header row
pub const NOTICE_HEIGHT: usize = 1;
pub const STATUSLINE_HEIGHT: usize = 1;

/// Filter inputs are laid out in rows of `FILTERS_PER_ROW` inside a bordered block.
pub fn filterbar_height(nfilters: usize) -> usize {
    filterbar_rows(nfilters) + 2
}

fn filterbar_rows(nfilters: usize) -> usize {
    nfilters.div_ceil(FILTERS_PER_ROW).max(1)
}

const COLUMN_SPACING: u16 = 2;
const COLUMN_WIDTH_MAX: usize = 48;
const COPY_GLYPH: &str = " ⧉";
const FILTER_SPACING: u16 = 2;

#[derive(Debug, Default)]
pub struct TableUI;

impl TableUI {
    pub fn new() -> Self {
        Self
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let uidata = model.uidata();
        if uidata.loaded {
            self.draw_table_screen(&uidata, frame);
        } else {
            self.draw_intake_screen(&uidata, frame);
        }
        if uidata.show_popup {
            self.draw_popup(&uidata.popup_message, frame);
        }
    }

    fn draw_intake_screen(&self, uidata: &UIData, frame: &mut Frame) {
        let area = popup_area(frame.area(), 72, 7);
        let block = Block::bordered()
            .title(Line::from(" probeview ".bold()).centered())
            .title_bottom(Line::from(vec![" Quit ".into(), "<Ctrl-C> ".blue().bold()]).centered())
            .border_set(border::THICK);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [hint_area, prompt_area, _, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        frame.render_widget(
            Paragraph::new("Load a csv file with a header line.".dark_gray()),
            hint_area,
        );
        if let Some((_, input)) = &uidata.prompt {
            let label = "File: ";
            frame.render_widget(
                Paragraph::new(Line::from(vec![label.yellow(), input.input.as_str().into()])),
                prompt_area,
            );
            set_cursor(frame, prompt_area, label.chars().count() + input.curser_pos);
        }
        frame.render_widget(
            Paragraph::new(uidata.status_message.as_str().italic()),
            status_area,
        );
    }

    fn draw_table_screen(&self, uidata: &UIData, frame: &mut Frame) {
        let [title_area, filter_area, table_area, notice_area, status_area] =
            Layout::vertical([
                Constraint::Length(TITLE_HEIGHT as u16),
                Constraint::Length(filterbar_height(uidata.filters.len()) as u16),
                Constraint::Min(TABLE_CHROME_HEIGHT as u16),
                Constraint::Length(NOTICE_HEIGHT as u16),
                Constraint::Length(STATUSLINE_HEIGHT as u16),
            ])
            .areas(frame.area());

        self.draw_title(uidata, frame, title_area);
        self.draw_filters(uidata, frame, filter_area);
        self.draw_table(uidata, frame, table_area);
        if uidata.show_notice {
            self.draw_notice(frame, notice_area);
        }
        self.draw_statusline(uidata, frame, status_area);
    }

    fn draw_title(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let title = Line::from(vec![
            " probeview ".bold(),
            format!(" {} of {} rows", uidata.nrows, uidata.total_rows).dark_gray(),
        ]);
        frame.render_widget(Paragraph::new(title), area);

        if let Some(count) = uidata.url_count {
            let badge = Line::from(vec![
                " URL Count: ".bold(),
                Span::raw(count.to_string()),
                " ".into(),
            ])
            .style(Style::new().bg(Color::DarkGray).fg(Color::White));
            frame.render_widget(Paragraph::new(badge).alignment(Alignment::Right), area);
        }
    }

    fn draw_filters(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let block = Block::bordered().title(" Filters ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let nrows = filterbar_rows(uidata.filters.len());
        let lines = Layout::vertical(vec![Constraint::Length(1); nrows]).split(inner);
        for (line_idx, line_area) in lines.iter().enumerate() {
            let cells = Layout::horizontal(vec![
                Constraint::Ratio(1, FILTERS_PER_ROW as u32);
                FILTERS_PER_ROW
            ])
            .spacing(FILTER_SPACING)
            .split(*line_area);

            for (cell_idx, cell_area) in cells.iter().enumerate() {
                let idx = line_idx * FILTERS_PER_ROW + cell_idx;
                let Some(entry) = uidata.filters.get(idx) else {
                    break;
                };
                let label = format!("{}: ", entry.key);
                let label_width = label.chars().count();
                let focused = uidata.focused_filter == Some(idx);
                let label = if focused {
                    label.black().on_yellow()
                } else {
                    label.yellow()
                };
                let value = if entry.value.is_empty() && !focused {
                    format!("Filter by {}", entry.key).dark_gray().italic()
                } else {
                    Span::raw(entry.value.as_str())
                };
                frame.render_widget(
                    Paragraph::new(Line::from(vec![label, value])),
                    *cell_area,
                );

                if focused && let Some((_, input)) = &uidata.prompt {
                    set_cursor(frame, *cell_area, label_width + input.curser_pos);
                }
            }
        }
    }

    fn draw_table(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let link_idx: Vec<bool> = uidata
            .headers
            .iter()
            .map(|h| *h == uidata.link_column)
            .collect();

        let widths: Vec<Constraint> = uidata
            .headers
            .iter()
            .enumerate()
            .map(|(cidx, h)| {
                let cell_width = uidata
                    .rows
                    .iter()
                    .filter_map(|r| r[cidx].as_deref())
                    .map(|c| c.chars().count())
                    .max()
                    .unwrap_or(0);
                let mut width = cell_width.max(h.chars().count());
                if link_idx[cidx] {
                    width += COPY_GLYPH.chars().count();
                }
                Constraint::Length(width.min(COLUMN_WIDTH_MAX) as u16)
            })
            .collect();

        let header = Row::new(
            uidata
                .headers
                .iter()
                .map(|h| Cell::from(h.as_str().bold())),
        )
        .style(Style::new().add_modifier(Modifier::UNDERLINED));

        let rows = uidata.rows.iter().map(|row| {
            Row::new(row.iter().enumerate().map(|(cidx, cell)| match cell {
                Some(value) if link_idx[cidx] => Cell::from(Line::from(vec![
                    Span::styled(
                        value.as_str(),
                        Style::new().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
                    ),
                    COPY_GLYPH.dark_gray(),
                ])),
                Some(value) => Cell::from(value.as_str()),
                None => Cell::from(""),
            }))
        });

        let instructions = Line::from(vec![
            " Filter ".into(),
            "</>".blue().bold(),
            " Copy url ".into(),
            "<c>".blue().bold(),
            " Browse ".into(),
            "<Enter>".blue().bold(),
            " Open ".into(),
            "<o>".blue().bold(),
            " Help ".into(),
            "<?>".blue().bold(),
            " Quit ".into(),
            "<q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(Line::from(format!(" {} ", uidata.name).bold()).centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(COLUMN_SPACING)
            .row_highlight_style(Style::new().add_modifier(Modifier::REVERSED));

        let mut state = TableState::default().with_selected(uidata.selected_row);
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_notice(&self, frame: &mut Frame, area: Rect) {
        let notice = Line::from(vec![
            " Copied to clipboard! ".bold(),
            " dismiss ".into(),
            "<x> ".blue().bold(),
        ])
        .style(Style::new().bg(Color::DarkGray).fg(Color::White));
        frame.render_widget(Paragraph::new(notice), area);
    }

    fn draw_statusline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        match &uidata.prompt {
            Some((PromptMode::OpenFile, input)) => {
                let label = "Open file: ";
                frame.render_widget(
                    Paragraph::new(Line::from(vec![label.yellow(), input.input.as_str().into()])),
                    area,
                );
                set_cursor(frame, area, label.chars().count() + input.curser_pos);
            }
            Some((PromptMode::Filter(_), _)) => {
                let help = Line::from(vec![
                    " Next filter ".into(),
                    "<Tab>".blue().bold(),
                    " Clear ".into(),
                    "<Ctrl-U>".blue().bold(),
                    " Done ".into(),
                    "<Enter>".blue().bold(),
                ]);
                frame.render_widget(Paragraph::new(help), area);
            }
            None => {
                let selected = if uidata.nrows > 0 {
                    format!("{}/{}", uidata.abs_selected_row + 1, uidata.nrows)
                } else {
                    "0/0".to_string()
                };
                frame.render_widget(
                    Paragraph::new(Line::raw(uidata.status_message.as_str())),
                    area,
                );
                frame.render_widget(
                    Paragraph::new(selected.dark_gray()).alignment(Alignment::Right),
                    area,
                );
            }
        }
    }

    fn draw_popup(&self, message: &str, frame: &mut Frame) {
        let text = Text::from(message);
        let height = text.height() as u16 + 2;
        let width = text.width() as u16 + 4;
        let area = popup_area(frame.area(), width, height);
        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn set_cursor(frame: &mut Frame, area: Rect, offset: usize) {
    let max_x = area.x + area.width.saturating_sub(1);
    let x = (area.x as usize + offset).min(max_x as usize) as u16;
    frame.set_cursor_position((x, area.y));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::domain::Message;
    use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{Terminal, backend::TestBackend};

    const RESULTS: &str = "input,title,status_code,content_length,port,url\n\
                          a.com,Home,200,12,443,https://a.com\n\
                          b.com,Login,404,0,80,http://b.com/login";

    fn render(model: &Model) -> String {
        render_sized(model, 140, 20)
    }

    fn render_sized(model: &Model, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        let ui = TableUI::new();
        terminal.draw(|f| ui.draw(model, f)).unwrap();
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|line| line.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<String>>()
            .join("\n")
    }

    fn loaded_model() -> Model {
        let mut model = Model::init(&AppConfig::default(), 140, 20);
        model
            .update(Message::FileLoaded {
                name: "results.csv".into(),
                content: RESULTS.into(),
            })
            .unwrap();
        model
    }

    #[test]
    fn intake_screen_has_no_table() {
        let model = Model::init(&AppConfig::default(), 140, 20);
        let screen = render(&model);
        assert!(screen.contains("File:"));
        assert!(!screen.contains("URL Count"));
        assert!(!screen.contains("Filters"));
    }

    #[test]
    fn table_screen() {
        let model = loaded_model();
        let screen = render(&model);
        assert!(screen.contains("URL Count: 2"));
        assert!(screen.contains("Filter by title"));
        assert!(screen.contains("status_code"));
        assert!(screen.contains("http://b.com/login"));
        assert!(screen.contains("Login"));
        assert!(!screen.contains("Copied to clipboard!"));
        let title = screen.lines().next().unwrap();
        assert!(title.contains("2 of 2 rows"));
        assert!(!title.contains("results.csv"));
        assert!(screen.contains("Loaded results.csv: 2 rows, 6 columns"));
    }

    #[test]
    fn every_filter_is_visible_on_narrow_terminal() {
        let mut model = Model::init(&AppConfig::default(), 80, 20);
        model
            .update(Message::FileLoaded {
                name: "results.csv".into(),
                content: RESULTS.into(),
            })
            .unwrap();
        let screen = render_sized(&model, 80, 20);
        assert!(screen.contains("Filter by input"));
        assert!(screen.contains("Filter by url"));

        model
            .update(Message::SetFilter {
                key: "url".into(),
                value: "zzz".into(),
            })
            .unwrap();
        let screen = render_sized(&model, 80, 20);
        assert!(screen.contains("url: zzz"));

        model
            .update(Message::SetFilter {
                key: "url".into(),
                value: String::new(),
            })
            .unwrap();
        model.update(Message::EditFilters).unwrap();
        model
            .update(Message::RawKey(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT)))
            .unwrap();
        for c in "zzz".chars() {
            model
                .update(Message::RawKey(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)))
                .unwrap();
        }
        assert_eq!(model.uidata().focused_filter, Some(5));
        let screen = render_sized(&model, 80, 20);
        assert!(screen.contains("url: zzz"));
    }

    #[test]
    fn filtered_rows_are_hidden() {
        let mut model = loaded_model();
        model
            .update(Message::SetFilter {
                key: "url".into(),
                value: "https".into(),
            })
            .unwrap();
        let screen = render(&model);
        assert!(screen.contains("https://a.com"));
        assert!(!screen.contains("Login"));
        assert!(screen.contains("URL Count: 1"));
    }

    #[test]
    fn notice_and_help() {
        let mut model = loaded_model();
        model.update(Message::CopySucceeded).unwrap();
        assert!(render(&model).contains("Copied to clipboard!"));

        model.update(Message::DismissNotice).unwrap();
        model.update(Message::Help).unwrap();
        let screen = render(&model);
        assert!(!screen.contains("Copied to clipboard!"));
        assert!(screen.contains("copy the url of the selected row"));
    }
}
