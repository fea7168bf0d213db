//! Static surah names.

use serde::Serialize;

/// Number of surahs in the corpus.
pub const SURAH_COUNT: u16 = 114;

/// Arabic and Latin-script names, indexed by `surah_no - 1`.
const SURAH_NAMES: [(&str, &str); SURAH_COUNT as usize] = [
    ("الفاتحة", "Al-Fatihah"),
    ("البقرة", "Al-Baqarah"),
    ("آل عمران", "Al-Imran"),
    ("النساء", "An-Nisa"),
    ("المائدة", "Al-Ma'idah"),
    ("الأنعام", "Al-An'am"),
    ("الأعراف", "Al-A'raf"),
    ("الأنفال", "Al-Anfal"),
    ("التوبة", "At-Tawbah"),
    ("يونس", "Yunus"),
    ("هود", "Hud"),
    ("يوسف", "Yusuf"),
    ("الرعد", "Ar-Ra'd"),
    ("إبراهيم", "Ibrahim"),
    ("الحجر", "Al-Hijr"),
    ("النحل", "An-Nahl"),
    ("الإسراء", "Al-Isra"),
    ("الكهف", "Al-Kahf"),
    ("مريم", "Maryam"),
    ("طه", "Ta-Ha"),
    ("الأنبياء", "Al-Anbiya"),
    ("الحج", "Al-Hajj"),
    ("المؤمنون", "Al-Mu'minun"),
    ("النور", "An-Nur"),
    ("الفرقان", "Al-Furqan"),
    ("الشعراء", "Ash-Shu'ara"),
    ("النمل", "An-Naml"),
    ("القصص", "Al-Qasas"),
    ("العنكبوت", "Al-Ankabut"),
    ("الروم", "Ar-Rum"),
    ("لقمان", "Luqman"),
    ("السجدة", "As-Sajdah"),
    ("الأحزاب", "Al-Ahzab"),
    ("سبأ", "Saba"),
    ("فاطر", "Fatir"),
    ("يس", "Ya-Sin"),
    ("الصافات", "As-Saffat"),
    ("ص", "Sad"),
    ("الزمر", "Az-Zumar"),
    ("غافر", "Ghafir"),
    ("فصلت", "Fussilat"),
    ("الشورى", "Ash-Shura"),
    ("الزخرف", "Az-Zukhruf"),
    ("الدخان", "Ad-Dukhan"),
    ("الجاثية", "Al-Jathiyah"),
    ("الأحقاف", "Al-Ahqaf"),
    ("محمد", "Muhammad"),
    ("الفتح", "Al-Fath"),
    ("الحجرات", "Al-Hujurat"),
    ("ق", "Qaf"),
    ("الذاريات", "Adh-Dhariyat"),
    ("الطور", "At-Tur"),
    ("النجم", "An-Najm"),
    ("القمر", "Al-Qamar"),
    ("الرحمن", "Ar-Rahman"),
    ("الواقعة", "Al-Waqi'ah"),
    ("الحديد", "Al-Hadid"),
    ("المجادلة", "Al-Mujadilah"),
    ("الحشر", "Al-Hashr"),
    ("الممتحنة", "Al-Mumtahanah"),
    ("الصف", "As-Saff"),
    ("الجمعة", "Al-Jumu'ah"),
    ("المنافقون", "Al-Munafiqun"),
    ("التغابن", "At-Taghabun"),
    ("الطلاق", "At-Talaq"),
    ("التحريم", "At-Tahrim"),
    ("الملك", "Al-Mulk"),
    ("القلم", "Al-Qalam"),
    ("الحاقة", "Al-Haqqah"),
    ("المعارج", "Al-Ma'arij"),
    ("نوح", "Nuh"),
    ("الجن", "Al-Jinn"),
    ("المزمل", "Al-Muzzammil"),
    ("المدثر", "Al-Muddaththir"),
    ("القيامة", "Al-Qiyamah"),
    ("الإنسان", "Al-Insan"),
    ("المرسلات", "Al-Mursalat"),
    ("النبأ", "An-Naba"),
    ("النازعات", "An-Nazi'at"),
    ("عبس", "Abasa"),
    ("التكوير", "At-Takwir"),
    ("الانفطار", "Al-Infitar"),
    ("المطففين", "Al-Mutaffifin"),
    ("الانشقاق", "Al-Inshiqaq"),
    ("البروج", "Al-Buruj"),
    ("الطارق", "At-Tariq"),
    ("الأعلى", "Al-A'la"),
    ("الغاشية", "Al-Ghashiyah"),
    ("الفجر", "Al-Fajr"),
    ("البلد", "Al-Balad"),
    ("الشمس", "Ash-Shams"),
    ("الليل", "Al-Layl"),
    ("الضحى", "Ad-Duha"),
    ("الشرح", "Ash-Sharh"),
    ("التين", "At-Tin"),
    ("العلق", "Al-Alaq"),
    ("القدر", "Al-Qadr"),
    ("البينة", "Al-Bayyinah"),
    ("الزلزلة", "Az-Zalzalah"),
    ("العاديات", "Al-Adiyat"),
    ("القارعة", "Al-Qari'ah"),
    ("التكاثر", "At-Takathur"),
    ("العصر", "Al-Asr"),
    ("الهمزة", "Al-Humazah"),
    ("الفيل", "Al-Fil"),
    ("قريش", "Quraysh"),
    ("الماعون", "Al-Ma'un"),
    ("الكوثر", "Al-Kawthar"),
    ("الكافرون", "Al-Kafirun"),
    ("النصر", "An-Nasr"),
    ("المسد", "Al-Masad"),
    ("الإخلاص", "Al-Ikhlas"),
    ("الفلق", "Al-Falaq"),
    ("الناس", "An-Nas"),
];

/// Surah metadata joined with the loaded verse count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurahMeta {
    pub surah_no: u16,
    pub name_ar: &'static str,
    pub name_latin: &'static str,
    /// Verses present in the loaded corpus (0 when the surah is absent)
    pub ayah_count: usize,
}

/// Check that a surah number is within `1..=114`.
#[inline]
pub fn is_valid_surah(surah_no: u16) -> bool {
    (1..=SURAH_COUNT).contains(&surah_no)
}

/// Look up the names of a surah.
pub fn surah_names(surah_no: u16) -> Option<(&'static str, &'static str)> {
    if !is_valid_surah(surah_no) {
        return None;
    }
    Some(SURAH_NAMES[(surah_no - 1) as usize])
}
