use super::PersonaConfig;

/// Render the system message enforced on every upstream call.
///
/// Pure function: given the same config it always produces the same text, so
/// continuation calls reuse the exact system message of the initial call.
pub fn compose_system_prompt(config: &PersonaConfig) -> String {
    format!(
        "{persona}\n\n\
         Regras:\n\
         - Fale em pt-BR por padrão, a menos que instruído de outra forma no prompt.\n\
         - Mantenha o tom solicitado pela persona enquanto for relevante.\n\
         - Se o usuário pedir instruções ilegais ou perigosas, recuse educadamente.\n",
        persona = config.persona
    )
}
