//! Built-in message templates, one per category.
//!
//! Field vocabulary: `name`, `due_date`, `server`, `price`, `package`,
//! `pix_key`, `company`, `contact`, and `message` (custom sends only).

use notify_core::NotificationCategory;

pub(crate) fn template_for(category: NotificationCategory) -> &'static str {
    match category {
        NotificationCategory::DueIn2Days => DUE_IN_2_DAYS,
        NotificationCategory::DueIn1Day => DUE_IN_1_DAY,
        NotificationCategory::DueToday => DUE_TODAY,
        NotificationCategory::Overdue1Day => OVERDUE_1_DAY,
        NotificationCategory::Renewal => RENEWAL,
        NotificationCategory::Welcome => WELCOME,
        NotificationCategory::Billing => BILLING,
        NotificationCategory::Promotional => PROMOTIONAL,
        NotificationCategory::Custom => CUSTOM,
    }
}

const DUE_IN_2_DAYS: &str = "\
🔔 *{company}*

Olá *{name}*!

⚠️ Seu plano vence em *2 dias* ({due_date})

📦 *Detalhes do seu plano:*
• Servidor: {server}
• Valor: R$ {price}
• Pacote: {package}

💳 *Para renovar, utilize o PIX:*
`{pix_key}`

📞 Dúvidas? Entre em contato: {contact}

_Renove já e continue aproveitando nossos serviços!_ ✨";

const DUE_IN_1_DAY: &str = "\
⏰ *{company}*

Olá *{name}*!

🚨 *ATENÇÃO!* Seu plano vence *AMANHÃ* ({due_date})

📦 *Detalhes do seu plano:*
• Servidor: {server}
• Valor: R$ {price}
• Pacote: {package}

💳 *PIX para renovação:*
`{pix_key}`

⚡ *Renove hoje e evite a interrupção do serviço!*

📞 Suporte: {contact}";

const DUE_TODAY: &str = "\
🚨 *{company}*

Olá *{name}*!

⛔ Seu plano *VENCE HOJE* ({due_date})

📦 *Detalhes do seu plano:*
• Servidor: {server}
• Valor: R$ {price}
• Pacote: {package}

💳 *PIX para renovação imediata:*
`{pix_key}`

🆘 *ÚLTIMA CHANCE!* Renove agora para não perder o acesso!

📞 Suporte urgente: {contact}";

const OVERDUE_1_DAY: &str = "\
❌ *{company}*

Olá *{name}*,

💔 Seu plano *VENCEU ONTEM* ({due_date})

📦 *Plano expirado:*
• Servidor: {server}
• Valor: R$ {price}
• Pacote: {package}

🔄 *Para reativar, efetue o pagamento via PIX:*
`{pix_key}`

💬 Após o pagamento, envie o comprovante para: {contact}

_Estamos aguardando sua renovação!_ 💙";

const RENEWAL: &str = "\
✅ *{company}*

Olá *{name}*!

Seu plano foi renovado com sucesso até *{due_date}*.

📦 Servidor: {server}
💰 Valor: R$ {price}

Obrigado pela confiança! 💙";

const WELCOME: &str = "\
🎉 *{company}*

Olá *{name}*, seja bem-vindo!

Seu plano está ativo até *{due_date}*.

📦 *Seu plano:*
• Servidor: {server}
• Valor: R$ {price}
• Pacote: {package}

📞 Qualquer dúvida, fale com a gente: {contact}";

const BILLING: &str = "\
💳 *{company}*

Olá *{name}*,

Identificamos uma pendência no seu plano ({due_date}).

*PIX para pagamento:*
`{pix_key}`

📞 Dúvidas? {contact}";

const PROMOTIONAL: &str = "📢 Olá {name}, confira nossa promoção especial!";

const CUSTOM: &str = "{message}";
