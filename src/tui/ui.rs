//! UI rendering for the debugger.
//!
//! Layout follows the cardboard original: program listing and CPU on the
//! left, the 10x10 memory board and card trays on the right.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table},
};
use crate::cpu::decode;
use crate::IoPort;
use super::app::DebuggerApp;

/// Cells shown per memory board row.
const BOARD_COLUMNS: usize = 10;

pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let [left, right] = Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)])
        .areas(frame.area());

    let [listing, cpu, status] = Layout::vertical([
        Constraint::Min(8),
        Constraint::Length(5),
        Constraint::Length(3),
    ])
    .areas(left);

    let [board, cards, help] = Layout::vertical([
        Constraint::Min(14),
        Constraint::Length(5),
        Constraint::Length(3),
    ])
    .areas(right);

    draw_listing(frame, listing, app);
    draw_cpu(frame, cpu, app);
    draw_status(frame, status, app);
    draw_board(frame, board, app);
    draw_cards(frame, cards, app);
    draw_help(frame, help);
}

fn panel(title: &str, color: Color) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

/// Program listing centred on PC, with breakpoint markers.
fn draw_listing(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let rows = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = rows
        .into_iter()
        .map(|(addr, text, at_pc)| {
            let marker = match (at_pc, app.breakpoints.contains(&addr)) {
                (true, _) => "▶",
                (false, true) => "●",
                _ => " ",
            };
            let style = if at_pc {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(&addr) {
                Style::default().fg(Color::Red)
            } else if text == "---" {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            ListItem::new(format!("{} {:02}  {}", marker, addr, text)).style(style)
        })
        .collect();

    frame.render_widget(List::new(items).block(panel("Listing", Color::Cyan)), area);
}

/// Accumulator, PC, IR and the decoded IR.
fn draw_cpu(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let regs = &app.cpu.regs;
    let acc_color = if regs.acc < 0 { Color::Red } else { Color::White };
    let decoded = decode::decode(regs.ir)
        .map(|instr| instr.to_string())
        .unwrap_or_else(|_| "?".to_string());

    let lines = vec![
        Line::from(vec![
            Span::raw("ACC "),
            Span::styled(format!("{:>6}", regs.acc), Style::default().fg(acc_color)),
            Span::raw("  PC "),
            Span::styled(format!("{:02}", regs.pc), Style::default().fg(Color::Yellow)),
            Span::raw("  IR "),
            Span::raw(format!("{:03} ({})", regs.ir, decoded)),
        ]),
        Line::from(vec![
            Span::raw("cycle "),
            Span::styled(app.cpu.cycles.to_string(), Style::default().fg(Color::Cyan)),
            Span::raw(if app.running { "  running" } else { "  stopped" }),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(panel("CPU", Color::Green)), area);
}

/// Memory as a 10-column board; rows scroll with `mem_scroll`.
fn draw_board(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let pc = app.cpu.regs.pc as usize;
    let visible = (area.height as usize).saturating_sub(3);
    let cells = app.cpu.mem.cells();

    let header = Row::new(
        std::iter::once(Cell::from("")).chain((0..BOARD_COLUMNS).map(|c| Cell::from(format!(" +{}", c)))),
    )
    .style(Style::default().fg(Color::DarkGray));

    let rows: Vec<Row> = cells
        .chunks(BOARD_COLUMNS)
        .enumerate()
        .skip(app.mem_scroll)
        .take(visible)
        .map(|(row, chunk)| {
            let base = row * BOARD_COLUMNS;
            let label = Cell::from(format!("{:02}", base)).style(Style::default().fg(Color::DarkGray));
            let values = chunk.iter().enumerate().map(|(col, cell)| {
                let style = if base + col == pc {
                    Style::default().fg(Color::Black).bg(Color::Yellow)
                } else if cell.is_none() {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                let text = cell.map(|w| w.to_string()).unwrap_or_else(|| " ---".to_string());
                Cell::from(format!("{:>4}", text)).style(style)
            });
            Row::new(std::iter::once(label).chain(values))
        })
        .collect();

    let widths = std::iter::once(Constraint::Length(3))
        .chain(std::iter::repeat(Constraint::Length(4)).take(BOARD_COLUMNS));

    let table = Table::new(rows, widths)
        .header(header)
        .block(panel("Memory", Color::Magenta));

    frame.render_widget(table, area);
}

/// Input hopper and output tray.
fn draw_cards(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let io = &app.cpu.io;
    let tray = io.output();
    let shown = (area.width as usize).saturating_sub(10) / 5;

    let lines = vec![
        Line::from(vec![
            Span::raw("in   "),
            Span::styled(io.peek_input().unwrap_or("(empty)").to_string(), Style::default().fg(Color::Cyan)),
            Span::styled(format!("  {} queued", io.remaining()), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            Span::raw("out  "),
            Span::styled(
                tray[tray.len().saturating_sub(shown)..].join(" "),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(Span::styled(format!("     {} punched", tray.len()), Style::default().fg(Color::DarkGray))),
    ];

    frame.render_widget(Paragraph::new(lines).block(panel("Cards", Color::Blue)), area);
}

fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    frame.render_widget(Paragraph::new(app.status.as_str()).block(panel("Status", Color::White)), area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new("s step  r run  p pause  b break  x reset  ↑↓ scroll  q quit")
        .style(Style::default().fg(Color::DarkGray))
        .block(panel("Keys", Color::DarkGray));

    frame.render_widget(help, area);
}
