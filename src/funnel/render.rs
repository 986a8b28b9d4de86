//! Message copy for every funnel step. All text is meant for `ParseMode::Html`.

use teloxide::utils::html::{bold, escape, italic};

use super::{
    content::{DiagnosisContent, Question},
    Category, Progress,
};

pub const START_BUTTON: &str = "Iniciar Diagnóstico";
pub const RESTART_BUTTON: &str = "Refazer Diagnóstico";

pub const PICK_AN_OPTION: &str = "Por favor, escolha uma das opções abaixo.";
pub const STILL_ANALYZING: &str =
    "Ainda estamos analisando suas respostas. Seu diagnóstico sai em instantes!";

const PROGRESS_CELLS: usize = 10;

pub fn landing() -> String {
    format!(
        "🩺 {}\n\n{}\n\n{}\n\n\
         ✅ {} Baseado em padrões de fisiopatologia do esporte.\n\
         ⚡ {} Identifique a origem mecânica da dor em menos de 2 minutos.\n\
         📄 {} Receba a indicação do protocolo correto para tratar.",
        italic("AVALIAÇÃO TÉCNICA GRATUITA"),
        bold("Por que seu joelho ou sua canela dói quando você corre?"),
        "Responda a 5 perguntas rápidas e receba seu diagnóstico personalizado \
         baseado em biomecânica da corrida de rua.",
        bold("100% Técnico."),
        bold("Análise Rápida."),
        bold("Relatório Final."),
    )
}

pub fn progress_bar(progress: Progress) -> String {
    let filled = (progress.fraction() * PROGRESS_CELLS as f64).round() as usize;
    let filled = filled.min(PROGRESS_CELLS);
    format!(
        "{}{} {}%",
        "▓".repeat(filled),
        "░".repeat(PROGRESS_CELLS - filled),
        progress.percent()
    )
}

pub fn question(question: &Question, progress: Progress) -> String {
    format!(
        "Questão {} de {}\n{}\n\n{}",
        progress.question_number(),
        progress.total,
        progress_bar(progress),
        bold(&escape(&question.text)),
    )
}

pub fn analyzing() -> String {
    format!(
        "⏳ {}\n{}",
        bold("Analisando suas respostas..."),
        "Cruzando sintomas com padrões biomecânicos da corrida."
    )
}

pub fn result(diagnosis: &DiagnosisContent, category: Category) -> String {
    let details = diagnosis
        .technical_details
        .iter()
        .map(|detail| format!("• {}", escape(detail)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "✅ {}\n\n{}\n\n{}\n\n{}\n{}\n\n{}\n{}\n\n{}\n\n{}",
        bold("Diagnóstico Concluído"),
        bold(&escape(&diagnosis.title)),
        escape(&diagnosis.description),
        bold("O que está acontecendo:"),
        details,
        bold("Recomendação Clínica:"),
        escape(&diagnosis.recommendation),
        pitch(category),
        italic("Este diagnóstico é informativo e não substitui consulta médica presencial."),
    )
}

/// Closing sales pitch. Only the body part named in it depends on the diagnosis.
pub fn pitch(category: Category) -> String {
    format!(
        "{}\n{}\n\n\
         Você não precisa de mais repouso passivo. Você precisa do protocolo \
         biomecânico específico para {}. O ebook {} é um manual técnico de \
         reabilitação ativa.\n\n\
         • Planilha de fortalecimento específico (PDF)\n\
         • Guia de correção de pisada e cadência\n\
         • Protocolo de retorno gradual à corrida\n\n\
         De <s>R$ 47,00</s> por {}\n\n\
         👉 {}",
        bold("PROTOCOLO DEFINITIVO"),
        bold("Elimine a dor sem parar de correr"),
        category.promo_target(),
        bold("\"Fim das Dores: Joelho e Canela do Corredor\""),
        bold("R$ 9,90"),
        bold("Baixar Protocolo Agora"),
    )
}
