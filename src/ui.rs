use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table},
};

use crate::dataset::{ColumnClass, ColumnSpec};
use crate::domain::HELP_TEXT;
use crate::model::UIData;

pub struct TableUI;

impl TableUI {
    pub fn new() -> Self {
        TableUI
    }

    pub fn draw(&self, uidata: &UIData, frame: &mut Frame) {
        let [stats_area, table_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.draw_stats(uidata, frame, stats_area);
        self.draw_table(uidata, frame, table_area);
        self.draw_status(uidata, frame, status_area);
        if uidata.show_help {
            self.draw_help(frame);
        }
    }

    fn draw_stats(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let controls_width = (uidata.page_label.len() + 18) as u16;
        let [left, right] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(controls_width)])
                .areas(area);

        frame.render_widget(Paragraph::new(uidata.stats_text.as_str()), left);

        let prev = if uidata.prev_enabled {
            "◀ prev".blue().bold()
        } else {
            "◀ prev".dim()
        };
        let next = if uidata.next_enabled {
            "next ▶".blue().bold()
        } else {
            "next ▶".dim()
        };
        let controls = Line::from(vec![
            prev,
            " ".into(),
            uidata.page_label.as_str().into(),
            " ".into(),
            next,
        ])
        .right_aligned();
        frame.render_widget(Paragraph::new(controls), right);
    }

    fn draw_table(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let title = Line::from(format!(" {} ", uidata.title).bold());
        let mut block = Block::bordered()
            .title(title.centered())
            .border_set(border::THICK);
        if uidata.loading {
            block = block.title_bottom(Line::from(" Loading… ".yellow().bold()).centered());
        } else if !uidata.search_term.is_empty() {
            block = block.title_bottom(
                Line::from(format!(" filter: {} ", uidata.search_term).italic()).centered(),
            );
        }

        // Empty filtered set gets one placeholder line instead of data rows.
        if let Some(message) = &uidata.empty_message {
            let placeholder = Paragraph::new(message.as_str().italic())
                .centered()
                .block(block);
            frame.render_widget(placeholder, area);
            return;
        }

        // Border (2) plus header (1); the window keeps the selection visible.
        let height = area.height.saturating_sub(3) as usize;
        let start = uidata
            .selected_row
            .saturating_sub(height.saturating_sub(1));

        let header = Row::new(
            std::iter::once(Cell::from("#".bold()))
                .chain(uidata.columns.iter().map(|col| Cell::from(col.header.bold())))
                .collect::<Vec<Cell>>(),
        );

        let rows = uidata
            .rows
            .iter()
            .enumerate()
            .skip(start)
            .take(height)
            .map(|(i, row)| {
                let mut cells = Vec::with_capacity(row.cells.len() + 1);
                cells.push(Cell::from(row.index.as_str().dim()));
                for (cell, col) in row.cells.iter().zip(uidata.columns) {
                    cells.push(Cell::from(Span::styled(cell.as_str(), class_style(col.class))));
                }
                let row = Row::new(cells);
                if i == uidata.selected_row {
                    row.style(Style::new().reversed())
                } else {
                    row
                }
            });

        let table = Table::new(rows, column_widths(uidata.columns))
            .header(header)
            .column_spacing(1)
            .block(block);
        frame.render_widget(table, area);
    }

    fn draw_status(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.active_cmdinput {
            let prompt = format!("/{}", uidata.cmdinput.input);
            frame.render_widget(Paragraph::new(prompt.as_str()), area);
            frame.set_cursor_position((
                area.x + 1 + uidata.cmdinput.cursor_pos as u16,
                area.y,
            ));
        } else if let Some(error) = &uidata.error_message {
            frame.render_widget(Paragraph::new(error.as_str().red().bold()), area);
        } else {
            let instructions = Line::from(vec![
                " Page ".into(),
                "<Left/Right>".blue().bold(),
                " Filter ".into(),
                "</>".blue().bold(),
                " Dataset ".into(),
                "<D>".blue().bold(),
                " Help ".into(),
                "<?>".blue().bold(),
                " Quit ".into(),
                "<Q> ".blue().bold(),
            ]);
            frame.render_widget(Paragraph::new(instructions), area);
        }
    }

    fn draw_help(&self, frame: &mut Frame) {
        let area = popup_area(frame.area(), 44, 16);
        frame.render_widget(Clear, area);
        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .title_bottom(Line::from(" Close <Esc> ".blue().bold()).centered())
            .border_set(border::THICK);
        frame.render_widget(Paragraph::new(HELP_TEXT).block(block), area);
    }
}

fn class_style(class: ColumnClass) -> Style {
    match class {
        ColumnClass::Word => Style::new().fg(Color::Cyan).bold(),
        ColumnClass::Definition => Style::new(),
        ColumnClass::Extra => Style::new().fg(Color::Gray),
    }
}

fn column_widths(columns: &[ColumnSpec]) -> Vec<Constraint> {
    std::iter::once(Constraint::Length(6))
        .chain(columns.iter().map(|col| match col.class {
            ColumnClass::Word => Constraint::Length(24),
            ColumnClass::Definition => Constraint::Fill(2),
            ColumnClass::Extra => Constraint::Fill(3),
        }))
        .collect()
}

fn popup_area(r: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    let x = r.x + (r.width - width) / 2;
    let y = r.y + (r.height - height) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset;

    #[test]
    fn widths_include_the_index_column() {
        let columns = dataset::find("alpaca").unwrap().columns;
        assert_eq!(column_widths(columns).len(), columns.len() + 1);
    }

    #[test]
    fn popup_is_centered_and_clamped() {
        let area = popup_area(Rect::new(0, 0, 100, 40), 44, 16);
        assert_eq!(area, Rect::new(28, 12, 44, 16));

        let small = popup_area(Rect::new(0, 0, 20, 10), 44, 16);
        assert_eq!(small, Rect::new(0, 0, 20, 10));
    }
}
