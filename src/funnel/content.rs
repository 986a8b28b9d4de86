use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};

use super::scoring::Category;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("content has no questions")]
    NoQuestions,
    #[error("question id {0} is used more than once")]
    DuplicateQuestionId(u32),
    #[error("question {question} has {count} option(s), at least 2 are required")]
    TooFewOptions { question: u32, count: usize },
    #[error("question {question} repeats option id {option:?}")]
    DuplicateOptionId { question: u32, option: String },
    #[error("question {question} repeats option text {text:?}")]
    DuplicateOptionText { question: u32, text: String },
    #[error("no diagnosis content for {0:?}")]
    MissingDiagnosis(Category),
    #[error("failed to read content file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed content file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    pub id: String,
    pub text: String,
    pub points_to: Category,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub id: u32,
    #[serde(rename = "question")]
    pub text: String,
    pub options: Vec<QuizOption>,
}

impl Question {
    pub fn option_by_text(&self, text: &str) -> Option<&QuizOption> {
        self.options.iter().find(|option| option.text == text)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisContent {
    pub title: String,
    pub description: String,
    pub technical_details: Vec<String>,
    pub recommendation: String,
}

/// Diagnosis copy for every category. Only built by validation, so lookups
/// are total.
#[derive(Debug, Clone)]
struct Diagnoses {
    knee: DiagnosisContent,
    shin: DiagnosisContent,
    both: DiagnosisContent,
}

impl Diagnoses {
    fn from_map(mut map: HashMap<Category, DiagnosisContent>) -> Result<Self, ContentError> {
        let mut take = |category: Category| {
            map.remove(&category)
                .ok_or(ContentError::MissingDiagnosis(category))
        };
        Ok(Self {
            knee: take(Category::Knee)?,
            shin: take(Category::Shin)?,
            both: take(Category::Both)?,
        })
    }

    fn get(&self, category: Category) -> &DiagnosisContent {
        match category {
            Category::Knee => &self.knee,
            Category::Shin => &self.shin,
            Category::Both => &self.both,
        }
    }
}

/// On-disk shape of a content file.
#[derive(serde::Deserialize)]
struct RawContent {
    questions: Vec<Question>,
    diagnoses: HashMap<Category, DiagnosisContent>,
}

/// Questions and diagnosis copy, validated once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct QuizContent {
    questions: Vec<Question>,
    diagnoses: Diagnoses,
}

impl QuizContent {
    pub fn new(
        questions: Vec<Question>,
        diagnoses: HashMap<Category, DiagnosisContent>,
    ) -> Result<Self, ContentError> {
        if questions.is_empty() {
            return Err(ContentError::NoQuestions);
        }

        let mut question_ids = HashSet::new();
        for question in &questions {
            if !question_ids.insert(question.id) {
                return Err(ContentError::DuplicateQuestionId(question.id));
            }
            validate_options(question)?;
        }

        Ok(Self {
            questions,
            diagnoses: Diagnoses::from_map(diagnoses)?,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let raw: RawContent = serde_json::from_str(json)?;
        Self::new(raw.questions, raw.diagnoses)
    }

    pub fn from_path(path: &Path) -> Result<Self, ContentError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn diagnosis(&self, category: Category) -> &DiagnosisContent {
        self.diagnoses.get(category)
    }

    /// The stock five-question deck about knee and shin pain in street runners.
    pub fn reference() -> Self {
        use Category::{Both, Knee, Shin};

        let questions = vec![
            question(
                1,
                "Onde a dor está localizada com maior intensidade?",
                &[
                    ("q1a", "Na parte da frente do joelho, ao redor ou atrás da rótula.", Knee),
                    ("q1b", "Na parte interna ou frontal da canela (tíbia).", Shin),
                    ("q1c", "Difusa, espalhando-se do joelho até o meio da perna.", Both),
                ],
            ),
            question(
                2,
                "Qual movimento específico agrava o sintoma?",
                &[
                    ("q2a", "Agachar, subir/descer escadas ou permanecer muito tempo sentado.", Knee),
                    ("q2b", "O impacto do pé no solo durante a corrida ou saltos.", Shin),
                    ("q2c", "Ambos os movimentos geram desconforto significativo.", Both),
                ],
            ),
            question(
                3,
                "Como você descreveria a sensação da dor?",
                &[
                    ("q3a", "Uma pontada aguda ou sensação de 'areia' dentro da articulação.", Knee),
                    ("q3b", "Uma queimação ou dor latejante ao longo do osso.", Shin),
                ],
            ),
            question(
                4,
                "Ao tocar a região, o que você sente?",
                &[
                    ("q4a", "Sensibilidade no tendão logo abaixo da rótula ou nas laterais.", Knee),
                    ("q4b", "Dor intensa ao pressionar a borda interna do osso da canela.", Shin),
                ],
            ),
            question(
                5,
                "Como a dor se comporta após o treino?",
                &[
                    ("q5a", "O joelho fica rígido e dolorido ao tentar esticar a perna.", Knee),
                    ("q5b", "A canela continua latejando mesmo em repouso.", Shin),
                ],
            ),
        ];

        let diagnoses = Diagnoses {
            knee: diagnosis(
                "Síndrome da Dor Femoropatelar",
                "Seus sintomas indicam uma sobrecarga na articulação do joelho, especificamente na região patelar. Isso ocorre frequentemente por desequilíbrio muscular e biomecânica inadequada.",
                &[
                    "Possível condromalácia ou tendinite patelar.",
                    "Sobrecarga no mecanismo extensor do joelho.",
                    "Necessidade urgente de fortalecimento de vasto medial e glúteo médio.",
                ],
                "O foco deve ser reequilíbrio muscular e correção biomecânica, não apenas repouso.",
            ),
            shin: diagnosis(
                "Síndrome do Estresse Tibial Medial",
                "Conhecida popularmente como 'Canelite'. Seus sintomas apontam para uma inflamação no periósteo (membrana que recobre o osso da tíbia) causada por impacto excessivo.",
                &[
                    "Microfissuras na estrutura óssea tibial.",
                    "Tensão excessiva no músculo sóleo e tibial posterior.",
                    "Risco de evolução para fratura por estresse se não tratado.",
                ],
                "É crucial reduzir o impacto temporariamente e fortalecer a musculatura da panturrilha e tibial anterior.",
            ),
            both: diagnosis(
                "Sobrecarga Biomecânica Combinada",
                "Seus sintomas indicam um colapso na absorção de impacto, afetando tanto a articulação do joelho quanto a estrutura tibial. É um quadro de alerta moderado a alto.",
                &[
                    "Cadeia cinética inferior comprometida (quadril, joelho e tornozelo).",
                    "Alta probabilidade de técnica de corrida (cadência/pisada) inadequada.",
                    "Inflamação sistêmica localizada no membro inferior.",
                ],
                "Uma abordagem integrada que corrija a aterrissagem e fortaleça toda a cadeia posterior é mandatória.",
            ),
        };

        Self {
            questions,
            diagnoses,
        }
    }
}

fn validate_options(question: &Question) -> Result<(), ContentError> {
    if question.options.len() < 2 {
        return Err(ContentError::TooFewOptions {
            question: question.id,
            count: question.options.len(),
        });
    }

    let mut ids = HashSet::new();
    let mut texts = HashSet::new();
    for option in &question.options {
        if !ids.insert(option.id.as_str()) {
            return Err(ContentError::DuplicateOptionId {
                question: question.id,
                option: option.id.clone(),
            });
        }
        // Answers come back as the pressed button's text.
        if !texts.insert(option.text.as_str()) {
            return Err(ContentError::DuplicateOptionText {
                question: question.id,
                text: option.text.clone(),
            });
        }
    }
    Ok(())
}

fn question(id: u32, text: &str, options: &[(&str, &str, Category)]) -> Question {
    Question {
        id,
        text: text.to_string(),
        options: options
            .iter()
            .map(|&(id, text, points_to)| QuizOption {
                id: id.to_string(),
                text: text.to_string(),
                points_to,
            })
            .collect(),
    }
}

fn diagnosis(
    title: &str,
    description: &str,
    technical_details: &[&str],
    recommendation: &str,
) -> DiagnosisContent {
    DiagnosisContent {
        title: title.to_string(),
        description: description.to_string(),
        technical_details: technical_details.iter().map(|d| d.to_string()).collect(),
        recommendation: recommendation.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn reference_parts() -> (Vec<Question>, HashMap<Category, DiagnosisContent>) {
        let content = QuizContent::reference();
        let diagnoses = Category::ALL
            .iter()
            .map(|&c| (c, content.diagnosis(c).clone()))
            .collect();
        (content.questions().to_vec(), diagnoses)
    }

    #[test]
    fn reference_deck_passes_validation() {
        let (questions, diagnoses) = reference_parts();
        let content = QuizContent::new(questions, diagnoses).unwrap();

        assert_eq!(content.question_count(), 5);
        let option_counts: Vec<usize> = content
            .questions()
            .iter()
            .map(|q| q.options.len())
            .collect();
        assert_eq!(option_counts, vec![3, 3, 2, 2, 2]);
    }

    #[test]
    fn reference_lookup_is_total() {
        let content = QuizContent::reference();
        assert_eq!(
            content.diagnosis(Category::Knee).title,
            "Síndrome da Dor Femoropatelar"
        );
        assert_eq!(
            content.diagnosis(Category::Shin).title,
            "Síndrome do Estresse Tibial Medial"
        );
        assert_eq!(
            content.diagnosis(Category::Both).title,
            "Sobrecarga Biomecânica Combinada"
        );
        for category in Category::ALL {
            assert_eq!(content.diagnosis(category).technical_details.len(), 3);
        }
    }

    #[test]
    fn rejects_missing_diagnosis() {
        let (questions, mut diagnoses) = reference_parts();
        diagnoses.remove(&Category::Both);

        let err = QuizContent::new(questions, diagnoses).unwrap_err();
        assert!(matches!(err, ContentError::MissingDiagnosis(Category::Both)));
    }

    #[test]
    fn rejects_empty_question_list() {
        let (_, diagnoses) = reference_parts();
        let err = QuizContent::new(Vec::new(), diagnoses).unwrap_err();
        assert!(matches!(err, ContentError::NoQuestions));
    }

    #[test]
    fn rejects_single_option_question() {
        let (mut questions, diagnoses) = reference_parts();
        questions[2].options.truncate(1);

        let err = QuizContent::new(questions, diagnoses).unwrap_err();
        assert!(matches!(
            err,
            ContentError::TooFewOptions {
                question: 3,
                count: 1
            }
        ));
    }

    #[test]
    fn rejects_duplicate_option_ids_and_texts() {
        let (mut questions, diagnoses) = reference_parts();
        questions[0].options[1].id = "q1a".to_string();
        let err = QuizContent::new(questions, diagnoses).unwrap_err();
        assert!(matches!(err, ContentError::DuplicateOptionId { question: 1, .. }));

        let (mut questions, diagnoses) = reference_parts();
        questions[4].options[1].text = questions[4].options[0].text.clone();
        let err = QuizContent::new(questions, diagnoses).unwrap_err();
        assert!(matches!(err, ContentError::DuplicateOptionText { question: 5, .. }));
    }

    #[test]
    fn rejects_duplicate_question_ids() {
        let (mut questions, diagnoses) = reference_parts();
        questions[1].id = 1;
        let err = QuizContent::new(questions, diagnoses).unwrap_err();
        assert!(matches!(err, ContentError::DuplicateQuestionId(1)));
    }

    #[test]
    fn loads_content_file() {
        let json = r#"{
            "questions": [
                { "id": 7, "question": "Dói?", "options": [
                    { "id": "a", "text": "Joelho", "pointsTo": "KNEE" },
                    { "id": "b", "text": "Canela", "pointsTo": "SHIN" }
                ] }
            ],
            "diagnoses": {
                "KNEE": { "title": "K", "description": "k", "technicalDetails": ["k1"], "recommendation": "rk" },
                "SHIN": { "title": "S", "description": "s", "technicalDetails": [], "recommendation": "rs" },
                "BOTH": { "title": "B", "description": "b", "technicalDetails": ["b1", "b2"], "recommendation": "rb" }
            }
        }"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let content = QuizContent::from_path(file.path()).unwrap();
        assert_eq!(content.question_count(), 1);
        let question = content.question(0).unwrap();
        assert_eq!(question.id, 7);
        assert_eq!(question.text, "Dói?");
        assert_eq!(
            question.option_by_text("Canela").map(|o| o.points_to),
            Some(Category::Shin)
        );
        assert_eq!(content.diagnosis(Category::Both).technical_details, ["b1", "b2"]);
    }

    #[test]
    fn content_file_without_both_diagnosis_is_rejected() {
        let json = r#"{
            "questions": [
                { "id": 1, "question": "?", "options": [
                    { "id": "a", "text": "x", "pointsTo": "KNEE" },
                    { "id": "b", "text": "y", "pointsTo": "BOTH" }
                ] }
            ],
            "diagnoses": {
                "KNEE": { "title": "K", "description": "k", "technicalDetails": [], "recommendation": "r" },
                "SHIN": { "title": "S", "description": "s", "technicalDetails": [], "recommendation": "r" }
            }
        }"#;
        let err = QuizContent::from_json(json).unwrap_err();
        assert!(matches!(err, ContentError::MissingDiagnosis(Category::Both)));
    }

    #[test]
    fn unknown_category_is_a_json_error() {
        let json = r#"{ "questions": [], "diagnoses": { "ANKLE": {
            "title": "", "description": "", "technicalDetails": [], "recommendation": "" } } }"#;
        assert!(matches!(
            QuizContent::from_json(json).unwrap_err(),
            ContentError::Json(_)
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = QuizContent::from_path(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ContentError::Io(_)));
    }
}
