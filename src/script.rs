//! Static conversation script — greeting, question steps, and prompts.
//!
//! The script is fixed at build time; the order of [`STEPS`] defines the
//! order of the conversation. All user-facing text is Spanish, formatted for
//! eventual WhatsApp sharing (asterisk bold, emojis).

/// One scripted question with its storage field and optional quick replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub id: &'static str,
    /// Profile key the answer is stored under. Unique across the script.
    pub field: &'static str,
    /// Spanish heading used when the answer is embedded in the generation prompt.
    pub label: &'static str,
    pub question: &'static str,
    pub placeholder: &'static str,
    /// Quick-reply choices. Empty slice means free text only.
    pub options: &'static [&'static str],
}

pub const INITIAL_GREETING: &str = "¡Hola! Soy CaliCoach, tu entrenador personal experto en calistenia. 💪

Estoy aquí para diseñar una rutina de entrenamiento con peso corporal totalmente personalizada para ti, lista para enviarse por WhatsApp.

Para comenzar, necesito conocerte un poco mejor. ¿Empezamos?

Por favor, dime: **¿Cuál es tu nombre, edad y sexo?**";

pub const STEPS: &[Step] = &[
    Step {
        id: "step1",
        field: "basics",
        label: "Datos Básicos",
        question: "¿Cuál es tu nombre, edad y sexo?",
        placeholder: "Ej: Juan, 25, Hombre",
        options: &[],
    },
    Step {
        id: "step2",
        field: "current_condition",
        label: "Condición Actual",
        question: "Genial. Hablemos de tu condición actual. \n\n1. ¿Nivel de experiencia? (Principiante/Intermedio/Avanzado)\n2. ¿Máximo de flexiones seguidas?\n3. ¿Máximo de dominadas?\n4. ¿Tiempo sin entrenar?",
        placeholder: "Ej: Intermedio, 20 flexiones, 5 dominadas, activo",
        options: &["Principiante", "Intermedio", "Avanzado"],
    },
    Step {
        id: "step3",
        field: "goals",
        label: "Objetivos",
        question: "¿Cuáles son tus objetivos principales? \n(Ej: Perder peso, Ganar músculo, Resistencia, Fuerza)\n¿Tienes una meta de tiempo?",
        placeholder: "Ej: Ganar músculo en 3 meses",
        options: &["Perder peso", "Ganar músculo", "Resistencia", "Fuerza", "Tonificar"],
    },
    Step {
        id: "step4",
        field: "availability",
        label: "Disponibilidad",
        question: "¿Cuál es tu disponibilidad?\n\n1. Días a la semana (3-6)\n2. Duración por sesión (20-60 min)\n3. Horario preferido",
        placeholder: "Ej: 4 días, 45 min, Tarde",
        options: &["3 días/semana", "4 días/semana", "5 días/semana", "30 min", "45 min", "60 min"],
    },
    Step {
        id: "step5",
        field: "limitations",
        label: "Limitaciones/Lesiones",
        question: "¿Tienes alguna lesión, condición médica o dolores (rodillas, hombros, espalda) que deba tener en cuenta?",
        placeholder: "Ninguna / Dolor leve en hombro derecho",
        options: &["Ninguna", "Dolor de rodilla", "Dolor de espalda", "Dolor de hombro"],
    },
    Step {
        id: "step6",
        field: "equipment",
        label: "Equipo Disponible",
        question: "¿Con qué equipo cuentas en casa?\n(Barra de dominadas, paralelas, bandas elásticas, sillas, o solo suelo)",
        placeholder: "Solo suelo y una silla resistente",
        options: &["Solo suelo", "Barra de dominadas", "Bandas elásticas", "Paralelas", "Sillas"],
    },
    Step {
        id: "step7",
        field: "whatsapp_contact",
        label: "Preferencias de Contacto",
        question: "Por último, ¿tienes alguna preferencia de qué días recibir las rutinas? (Opcional: Si quieres formato listo para enviar a un amigo, dime su nombre)",
        placeholder: "Lunes a Viernes",
        options: &["Lunes, Miércoles, Viernes", "Lunes a Jueves", "Fin de semana"],
    },
];

/// System instruction for the routine generator.
pub const SYSTEM_INSTRUCTION: &str = "Eres un entrenador personal experto especializado en entrenamientos con peso corporal (calistenia).
Tu objetivo es crear rutinas personalizadas basadas en los datos proporcionados por el usuario.
La salida DEBE estar formateada específicamente para ser enviada por WhatsApp (usa emojis, negritas con asteriscos, listas limpias).

Estructura de la rutina requerida:
1. Calentamiento (5-8 min)
2. Circuito principal (ejercicios específicos con repeticiones/tiempo)
3. Enfriamiento y estiramientos (5 min)

Tono:
- Motivador y cercano
- Usa emojis apropiadamente
- Celebra logros
- Profesional pero amigable

Incluye una sección de SEGUIMIENTO al final recomendando preguntar en una semana cómo se sienten.
";

/// Fixed apology shown when the generation call fails. Plain text, not markdown.
pub const GENERATION_APOLOGY: &str =
    "Lo siento, tuve un problema generando la rutina. ¿Podemos intentar de nuevo?";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn script_has_seven_steps() {
        assert_eq!(STEPS.len(), 7);
    }

    #[test]
    fn step_fields_are_unique() {
        let fields: HashSet<&str> = STEPS.iter().map(|s| s.field).collect();
        assert_eq!(fields.len(), STEPS.len());
        let ids: HashSet<&str> = STEPS.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), STEPS.len());
    }

    #[test]
    fn steps_have_question_and_label() {
        for step in STEPS {
            assert!(!step.question.trim().is_empty(), "{} has no question", step.id);
            assert!(!step.label.trim().is_empty(), "{} has no label", step.id);
            assert!(!step.placeholder.trim().is_empty(), "{} has no placeholder", step.id);
        }
    }

    #[test]
    fn first_step_is_free_text_only() {
        assert!(STEPS[0].options.is_empty());
        assert_eq!(STEPS[0].field, "basics");
    }
}
